//! Run configuration and its defaults.

use std::path::PathBuf;

use crate::writer::WriteOptions;

pub const DEFAULT_OUTPUT_DIR: &str = "for_upload";
pub const DEFAULT_OUTPUT_NAME: &str = "casos_integrados";
pub const DEFAULT_EXTENSION: &str = "json";
pub const DEFAULT_ANOMALY_LOG: &str = "anomalies.log";
/// Single-file limit of the usual bulk-upload web interface (10 MB).
pub const DEFAULT_BYTE_LIMIT: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub output_name: String,
    pub extension: String,
    /// `None` writes everything to one un-numbered file.
    pub byte_limit: Option<u64>,
    pub anomaly_log_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            byte_limit: Some(DEFAULT_BYTE_LIMIT),
            anomaly_log_name: DEFAULT_ANOMALY_LOG.to_string(),
        }
    }
}

impl RunConfig {
    /// Maps the command-line byte limit, where any negative value means unlimited.
    pub fn byte_limit_from_arg(limit: i64) -> Option<u64> {
        u64::try_from(limit).ok()
    }

    pub fn anomaly_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.anomaly_log_name)
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            output_dir: self.output_dir.clone(),
            file_name: self.output_name.clone(),
            extension: self.extension.clone(),
            byte_limit: self.byte_limit,
        }
    }
}
