use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::aggregation::{merge_row, CsvRow};
use crate::anomaly::AnomalyLog;
use crate::error::{CovidDataError, Result};
use crate::model::{AggregateTree, Category, MergeRole};
use crate::schema::input;

/// An input CSV that has been checked and opened, but not yet read.
#[derive(Debug)]
pub struct InputFile {
    path: PathBuf,
    file: File,
}

impl InputFile {
    /// Opens `path` for reading, distinguishing a missing file from one
    /// that exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(CovidDataError::InputNotFound { path });
        }
        if path.is_dir() {
            return Err(CovidDataError::InputUnreadable {
                path,
                reason: "is a directory".into(),
            });
        }
        match File::open(&path) {
            Ok(file) => Ok(Self { path, file }),
            Err(e) => Err(CovidDataError::InputUnreadable {
                path,
                reason: e.to_string(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Reads one input file into the shared tree.
///
/// The header row is the date axis; every following row is merged as
/// `category` under `role`. Returns the number of data rows merged.
pub fn ingest(
    input: InputFile,
    category: Category,
    role: MergeRole,
    tree: &mut AggregateTree,
    anomalies: &mut AnomalyLog,
) -> Result<usize> {
    let source_name = input.source_name();
    info!(file = %input.path().display(), category = category.raw_field(), "Reading input file");

    let df = read_csv_as_strings(input.file).map_err(|e| CovidDataError::MalformedCsv {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;

    let date_axis: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let columns: Vec<&StringChunked> = df
        .get_columns()
        .iter()
        .map(|column| column.str())
        .collect::<PolarsResult<_>>()?;

    for i in 0..df.height() {
        let row = CsvRow {
            source_name: &source_name,
            // header is line 1
            line: i + 2,
            cells: columns.iter().map(|column| column.get(i)).collect(),
        };
        merge_row(tree, &row, &date_axis, category, role, anomalies)?;
    }

    info!(
        file = %source_name,
        rows = df.height(),
        dates = date_axis.len().saturating_sub(input::FIRST_DATE),
        "Merged input file"
    );
    Ok(df.height())
}

/// Read a CSV with all columns as String dtype, trimming header labels.
fn read_csv_as_strings(file: File) -> PolarsResult<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .into_reader_with_file_handle(file)
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}
