//! Merges the tested, confirmed and deceased case extracts published by
//! MSPAS into one region → municipality → date time series, adds an
//! exponentially smoothed trend to every daily count, and writes the result
//! as size-bounded NDJSON files ready for bulk upload.

pub mod aggregation;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod flatten;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod writer;

pub use config::RunConfig;
pub use error::{CovidDataError, Result};
pub use pipeline::{run, CaseFiles, RunSummary};
