use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use emulation_score::config::{self, Config, OutputFormat};
use emulation_score::criteria::ReviewStage;
use emulation_score::evaluation::{self, EvaluationFile, EvaluationReport};
use emulation_score::output;
use emulation_score::scoring::ScoringEngine;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_VALIDATION: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank units by total score
    Rank {
        /// Evaluation file (YAML, or JSON by extension)
        file: PathBuf,
    },
    /// Show the per-criterion breakdown for matching units
    Detail {
        file: PathBuf,
        /// Unit id or name; glob patterns such as "District*" are allowed
        unit: String,
    },
    /// List the cluster leader of every quantitative criterion
    Leaders { file: PathBuf },
    /// Validate an evaluation file without scoring it
    Check { file: PathBuf },
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "emulation-score")]
#[command(about = "Score and rank units in competitive emulation evaluations", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/emulation-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Review stage to score: self, review1, review2 (or final)
    #[arg(short, long, global = true, value_parser = parse_stage)]
    stage: Option<ReviewStage>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn parse_stage(s: &str) -> Result<ReviewStage, String> {
    ReviewStage::parse(s).ok_or_else(|| format!("unknown stage '{}'", s))
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    if let Err(e) = emulation_score::logging::init(cli.verbose) {
        eprintln!("Logging error: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    if let Commands::Init { force } = &cli.command {
        init_config(cli.config.clone(), *force);
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let stage = cli.stage.unwrap_or_else(|| config.effective_stage());
    let format = cli.format.unwrap_or_else(|| config.effective_format());
    let engine = ScoringEngine::new(config.effective_scoring());
    let use_colors = cli.output.is_none() && output::should_use_colors();

    let rendered = match &cli.command {
        Commands::Check { file } => {
            let evaluation = load_checked(file);
            println!(
                "{}: {} criteria, {} units, {} results - ok",
                evaluation.name,
                evaluation.criteria.len(),
                evaluation.units.len(),
                evaluation.results.len()
            );
            None
        }
        Commands::Rank { file } => {
            let report = score(file, stage, &engine);
            Some(match format {
                OutputFormat::Table => output::format_ranked_table(&report, use_colors),
                OutputFormat::Tsv => output::format_tsv(&report),
                OutputFormat::Json => match output::format_json(&report) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("Failed to serialize report: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                },
            })
        }
        Commands::Detail { file, unit } => {
            let report = score(file, stage, &engine);
            Some(render_detail(&report, unit, format, use_colors))
        }
        Commands::Leaders { file } => {
            let report = score(file, stage, &engine);
            Some(match format {
                OutputFormat::Json => to_json(&report.leaders),
                _ => output::format_leaders(&report, use_colors),
            })
        }
        Commands::Init { .. } => None,
    };

    if let Some(content) = rendered {
        emit(&content, cli.output.as_deref());
    }

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}

/// Load an evaluation file and validate it, exiting on any problem.
fn load_checked(path: &Path) -> EvaluationFile {
    let file = match evaluation::load_evaluation(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    if let Err(errors) = evaluation::validate_evaluation(&file) {
        eprintln!("Evaluation file errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_VALIDATION);
    }

    file
}

fn score(path: &Path, stage: ReviewStage, engine: &ScoringEngine) -> EvaluationReport {
    let file = load_checked(path);
    tracing::debug!(stage = stage.label(), "scoring '{}'", file.name);

    match evaluation::score_evaluation(&file, stage, engine) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Evaluation file errors:\n  - {}", e);
            std::process::exit(EXIT_VALIDATION);
        }
    }
}

fn render_detail(report: &EvaluationReport, unit: &str, format: OutputFormat, use_colors: bool) -> String {
    let pattern = match glob::Pattern::new(unit) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid unit pattern '{}': {}", unit, e);
            std::process::exit(EXIT_INPUT);
        }
    };

    let matched: Vec<_> = report
        .units
        .iter()
        .filter(|u| pattern.matches(&u.unit_id) || pattern.matches(&u.unit_name))
        .collect();

    if matched.is_empty() {
        eprintln!("No unit matches '{}'.", unit);
        std::process::exit(EXIT_INPUT);
    }

    match format {
        OutputFormat::Json => to_json(&matched),
        _ => matched
            .iter()
            .map(|u| output::format_unit_detail(u, use_colors))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

fn emit(content: &str, path: Option<&Path>) {
    match path {
        Some(path) => {
            if let Err(e) = output::write_output(path, content) {
                eprintln!("Output error: {:#}", e);
                std::process::exit(EXIT_INPUT);
            }
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", content),
    }
}

fn init_config(path: Option<PathBuf>, force: bool) {
    let path = match path.map(Ok).unwrap_or_else(config::get_config_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if path.exists() && !force {
        eprintln!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
        std::process::exit(EXIT_CONFIG);
    }

    let defaults = Config {
        stage: Some(ReviewStage::Review2),
        format: Some(OutputFormat::Table),
        scoring: Some(Default::default()),
    };
    if let Err(e) = config::save_config(&path, &defaults) {
        eprintln!("Config error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }
    println!("Wrote default config to {}", path.display());
}
