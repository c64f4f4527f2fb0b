pub mod formatter;
pub mod writer;

pub use formatter::{
    format_json, format_leaders, format_ranked_table, format_score, format_tsv, format_unit_detail,
    should_use_colors,
};
pub use writer::write_output;
