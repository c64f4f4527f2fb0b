pub mod tree;
pub mod types;

pub use tree::{CeilingViolation, CriteriaTree, TreeError};
pub use types::*;
