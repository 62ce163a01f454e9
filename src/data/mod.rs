//! Dataset acquisition: local directory, remote base URL, or synthetic demo data.

pub mod sample;
pub mod source;

pub use source::{load_market_data, DataSource, DatasetReport, LoadReport};
