use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::evaluation::{EvaluationReport, UnitReport};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Scores always show two decimals ("7.50", "-2.00")
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format units as a ranked table with columns: Rank, Total, Name, Cluster
/// Rank column: 4 chars (fits "999."), right-aligned
/// Total column is right-aligned, 8 chars wide (fits "99999.99")
pub fn format_ranked_table(report: &EvaluationReport, use_colors: bool) -> String {
    if report.units.is_empty() {
        return "No units found.".to_string();
    }

    let term_width = get_terminal_width();
    let rank_width = 4;
    let total_width = 8;
    let separator = "  ";

    report
        .units
        .iter()
        .map(|unit| {
            let rank_str = format!("{:>3}.", unit.rank);
            let total_str = format!("{:>width$}", format_score(unit.total), width = total_width);

            let fixed_width = rank_width + 1 + total_width + separator.len() * 2 + unit.cluster.len();
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(&unit.unit_name, width - fixed_width),
                Some(_) => truncate_text(&unit.unit_name, 20),
                None => unit.unit_name.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    rank_str.dimmed(),
                    total_str.bold(),
                    separator,
                    name,
                    separator,
                    unit.cluster.cyan()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    rank_str, total_str, separator, name, separator, unit.cluster
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format units as tab-separated values for scripting
/// Columns: rank, cluster_rank, total, unit_id, name, cluster (no headers, no colors)
pub fn format_tsv(report: &EvaluationReport) -> String {
    report
        .units
        .iter()
        .map(|unit| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                unit.rank,
                unit.cluster_rank,
                format_score(unit.total),
                unit.unit_id,
                unit.unit_name,
                unit.cluster
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one unit's criterion tree with per-criterion scores and the rule
/// behind each leaf score.
pub fn format_unit_detail(unit: &UnitReport, use_colors: bool) -> String {
    let mut lines = Vec::with_capacity(unit.criteria.len() + 2);

    let header = format!(
        "{} ({}) - rank {}, cluster rank {}",
        unit.unit_name, unit.unit_id, unit.rank, unit.cluster_rank
    );
    if use_colors {
        lines.push(header.bold().to_string());
    } else {
        lines.push(header);
    }

    for criterion in &unit.criteria {
        let indent = "  ".repeat(criterion.depth + 1);
        let score = format!(
            "{}/{}",
            format_score(criterion.score),
            format_score(criterion.max_score)
        );
        let note = criterion
            .basis
            .as_ref()
            .map(|b| format!("  ({})", b.describe()))
            .unwrap_or_default();

        if use_colors {
            let score = if criterion.basis.is_none() {
                score.bold().to_string()
            } else {
                score
            };
            lines.push(format!(
                "{}{} {}  {}{}",
                indent,
                criterion.code.dimmed(),
                criterion.name,
                score,
                note.dimmed()
            ));
        } else {
            lines.push(format!(
                "{}{} {}  {}{}",
                indent, criterion.code, criterion.name, score, note
            ));
        }
    }

    for violation in &unit.ceiling_violations {
        let warning = format!(
            "  warning: {} scored {} above its max {}",
            violation.criterion_id,
            format_score(violation.score),
            format_score(violation.max_score)
        );
        if use_colors {
            lines.push(warning.yellow().to_string());
        } else {
            lines.push(warning);
        }
    }

    let total = format!("  Total: {}", format_score(unit.total));
    if use_colors {
        lines.push(total.bold().to_string());
    } else {
        lines.push(total);
    }

    lines.join("\n")
}

/// Format cluster leaders, one line per (cluster, criterion)
pub fn format_leaders(report: &EvaluationReport, use_colors: bool) -> String {
    if report.leaders.is_empty() {
        return "No quantitative results found.".to_string();
    }

    report
        .leaders
        .iter()
        .map(|entry| {
            let cluster = if entry.cluster.is_empty() {
                "(no cluster)"
            } else {
                entry.cluster.as_str()
            };
            if use_colors {
                format!(
                    "{} | {} | {} | {}",
                    cluster.cyan(),
                    entry.criterion_id,
                    entry.leader.unit_id.yellow(),
                    format_score(entry.leader.actual_value).bold()
                )
            } else {
                format!(
                    "{} | {} | {} | {}",
                    cluster,
                    entry.criterion_id,
                    entry.leader.unit_id,
                    format_score(entry.leader.actual_value)
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_json(report: &EvaluationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
