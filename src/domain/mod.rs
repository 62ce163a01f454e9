//! Shared domain types for the aggregation engine and its collaborators.

mod types;

pub use types::*;
