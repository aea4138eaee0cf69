//! NDJSON output split across size-bounded files.
//!
//! Lines are newline-separated, not newline-terminated. With a byte budget
//! the files are numbered `<name>-01.<ext>`, `<name>-02.<ext>`, ...; without
//! one a single `<name>.<ext>` is written.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;

const SEPARATOR: &str = "\n";

/// Where and how the output files are written.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub extension: String,
    /// Bytes allowed per file. `None` disables rotation and numbering.
    pub byte_limit: Option<u64>,
}

impl WriteOptions {
    /// Path of output file number `sequence` (1-based).
    pub fn file_path(&self, sequence: u32) -> PathBuf {
        let name = match self.byte_limit {
            Some(_) => format!("{}-{:02}.{}", self.file_name, sequence, self.extension),
            None => format!("{}.{}", self.file_name, self.extension),
        };
        self.output_dir.join(name)
    }

    /// Glob matching every file a previous run may have produced.
    fn previous_outputs_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.output_dir.to_string_lossy());
        let name = glob::Pattern::escape(&self.file_name);
        let extension = glob::Pattern::escape(&self.extension);
        Path::new(&dir)
            .join(format!("{name}*.{extension}"))
            .to_string_lossy()
            .into_owned()
    }
}

/// Deletes `<name>*.<ext>` in the output directory. Returns how many files went.
pub fn clear_old_outputs(options: &WriteOptions) -> Result<usize> {
    let pattern = options.previous_outputs_pattern();
    let paths = glob::glob(&pattern).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let mut removed = 0;
    for entry in paths {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_file() {
            fs::remove_file(&path)?;
            debug!(file = %path.display(), "Removed previous output");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Appends records as JSON lines, opening a new numbered file whenever the
/// next line would push the active one past the byte budget.
///
/// Every line after the writer's first carries a leading separator, and the
/// separator stays with its line across a rotation, so numbered files after
/// the first begin with a newline. The budget check counts it. A line larger
/// than the whole budget is still written, alone in a freshly opened file.
#[derive(Debug)]
pub struct RotatingWriter {
    options: WriteOptions,
    sequence: u32,
    first_line_written: bool,
    bytes_written: u64,
    active: Option<File>,
    files: Vec<PathBuf>,
    records: usize,
}

impl RotatingWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            sequence: 1,
            first_line_written: false,
            bytes_written: 0,
            active: None,
            files: Vec::new(),
            records: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let separator = if self.first_line_written { SEPARATOR } else { "" };
        let prefixed = format!("{separator}{line}");
        let next_len = prefixed.len() as u64;

        if let Some(limit) = self.options.byte_limit {
            if limit > 0 && self.bytes_written + next_len > limit {
                self.rotate();
            }
        }

        let file = match self.active.take() {
            Some(file) => file,
            None => self.open_active()?,
        };
        let file = self.active.insert(file);
        file.write_all(prefixed.as_bytes())?;

        self.first_line_written = true;
        self.bytes_written += next_len;
        self.records += 1;
        Ok(())
    }

    /// Output files touched so far, in order.
    #[cfg(test)]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes the active file and returns the list of files written.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        if let Some(file) = self.active.as_mut() {
            file.flush()?;
        }
        Ok(self.files)
    }

    fn rotate(&mut self) {
        self.sequence += 1;
        self.bytes_written = 0;
        self.active = None;
        debug!(sequence = self.sequence, "Byte budget reached, rotating output file");
    }

    fn open_active(&mut self) -> Result<File> {
        let path = self.options.file_path(self.sequence);
        info!(file = %path.display(), "Generating output file");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.files.push(path);
        Ok(file)
    }
}
