use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::anomaly::AnomalyLog;
use crate::config::RunConfig;
use crate::error::{CovidDataError, Result};
use crate::flatten::flatten;
use crate::ingest::{ingest, InputFile};
use crate::model::{AggregateTree, Category, MergeRole};
use crate::writer::{clear_old_outputs, RotatingWriter};

/// The three daily extracts, in the order they are merged.
#[derive(Debug, Clone)]
pub struct CaseFiles {
    pub tested: PathBuf,
    pub confirmed: PathBuf,
    pub deceased: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub regions: usize,
    pub sub_regions: usize,
    pub records: usize,
    pub files: Vec<PathBuf>,
    pub anomalies: usize,
}

/// Merges the three extracts and writes the NDJSON output.
///
/// All inputs are opened before the output directory is touched, so a
/// missing file leaves no partial output behind. Anomaly notes are only
/// written once every input has merged cleanly.
pub fn run(inputs: &CaseFiles, config: &RunConfig) -> Result<RunSummary> {
    let tested = InputFile::open(&inputs.tested)?;
    let confirmed = InputFile::open(&inputs.confirmed)?;
    let deceased = InputFile::open(&inputs.deceased)?;

    ensure_output_dir(&config.output_dir)?;
    let mut anomalies = AnomalyLog::create(config.anomaly_log_path())?;

    let mut tree = AggregateTree::new();
    let passes = [
        (tested, Category::Tested, MergeRole::Primary),
        (confirmed, Category::Confirmed, MergeRole::Secondary),
        (deceased, Category::Deceased, MergeRole::Secondary),
    ];
    for (input, category, role) in passes {
        ingest(input, category, role, &mut tree, &mut anomalies)?;
    }
    anomalies.persist()?;
    if anomalies.notes() > 0 {
        info!(
            log = %anomalies.path().display(),
            notes = anomalies.notes(),
            "Secondary files introduced new keys"
        );
    }

    let options = config.write_options();
    let removed = clear_old_outputs(&options)?;
    if removed > 0 {
        info!(removed, "Cleared output files from a previous run");
    }

    let mut writer = RotatingWriter::new(options);
    for record in flatten(&tree) {
        writer.write(&record)?;
    }
    let records = writer.records();
    let files = writer.finish()?;

    Ok(RunSummary {
        regions: tree.region_count(),
        sub_regions: tree.sub_region_count(),
        records,
        files,
        anomalies: anomalies.notes(),
    })
}

fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| CovidDataError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    })
}
