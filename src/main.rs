use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use guate_covid_data::config::{DEFAULT_BYTE_LIMIT, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_NAME};
use guate_covid_data::{run, CaseFiles, RunConfig};

/// Merge the daily MSPAS case extracts into NDJSON for bulk upload.
#[derive(Debug, Parser)]
#[command(name = "guate-covid-data", version)]
struct Cli {
    /// Tested cases CSV (casos tamizados)
    tamizados: Option<PathBuf>,

    /// Confirmed cases CSV (casos confirmados)
    confirmados: Option<PathBuf>,

    /// Deceased CSV (casos fallecidos)
    fallecidos: Option<PathBuf>,

    /// Write a single output file with no size limit
    #[arg(long)]
    completo: bool,

    #[arg(long, env = "GUATE_COVID_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    #[arg(long, env = "GUATE_COVID_OUTPUT_NAME", default_value = DEFAULT_OUTPUT_NAME)]
    output_name: String,

    /// Bytes per output file; -1 for unlimited
    #[arg(
        long,
        env = "GUATE_COVID_BYTE_LIMIT",
        default_value_t = DEFAULT_BYTE_LIMIT as i64,
        allow_negative_numbers = true
    )]
    byte_limit: i64,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let byte_limit = if self.completo {
            None
        } else {
            RunConfig::byte_limit_from_arg(self.byte_limit)
        };
        RunConfig {
            output_dir: self.output_dir.clone(),
            output_name: self.output_name.clone(),
            byte_limit,
            ..RunConfig::default()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nERROR: {e:#}\n");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let (Some(tested), Some(confirmed), Some(deceased)) =
        (&cli.tamizados, &cli.confirmados, &cli.fallecidos)
    else {
        debug!("Fewer than three input files given, nothing to do");
        return Ok(());
    };

    let inputs = CaseFiles {
        tested: tested.clone(),
        confirmed: confirmed.clone(),
        deceased: deceased.clone(),
    };
    let config = cli.run_config();

    let summary = run(&inputs, &config).context("Could not generate the upload files")?;

    info!(
        regions = summary.regions,
        sub_regions = summary.sub_regions,
        records = summary.records,
        files = summary.files.len(),
        anomalies = summary.anomalies,
        "Done"
    );
    Ok(())
}
