pub mod config;
pub mod criteria;
pub mod evaluation;
pub mod logging;
pub mod output;
pub mod scoring;
