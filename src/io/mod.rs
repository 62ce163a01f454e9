//! CSV input/output: dataset ingest, derived-series export, JSON snapshots.

pub mod export;
pub mod ingest;
pub mod snapshot;
