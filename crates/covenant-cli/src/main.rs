mod display;
mod generate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use covenant_core::RecordKind;
use covenant_store::{Layout, MarkdownSink};
use tracing_subscriber::EnvFilter;

use crate::generate::{GenerateError, GenerateRequest, Generator, validate_file};

#[derive(Parser)]
#[command(name = "covenant", version, about = "Generate worker contracts from JSON records")]
struct Cli {
    /// Project root containing templates/, config/, and outputs/.
    #[arg(long, global = true, env = "COVENANT_BASE_PATH", default_value = ".")]
    base_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a contract (and NDA when required) from worker and contract records.
    Generate {
        #[arg(long)]
        worker: PathBuf,
        #[arg(long)]
        contract: PathBuf,
        /// Company record; defaults to config/company.json under the base path.
        #[arg(long)]
        company: Option<PathBuf>,
        /// Validate the records first and refuse to generate on any violation.
        #[arg(long)]
        strict: bool,
    },
    /// Check one record file against its rule set. Exits 1 on any violation.
    Validate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "type", value_enum)]
        kind: KindArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Worker,
    Contract,
    Payment,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Worker => RecordKind::Worker,
            KindArg::Contract => RecordKind::Contract,
            KindArg::Payment => RecordKind::Payment,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("covenant v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let layout = Layout::new(cli.base_path);

    match cli.command {
        Command::Generate {
            worker,
            contract,
            company,
            strict,
        } => {
            let sink = MarkdownSink::new(layout.outputs_dir());
            let generator = Generator::new(layout, sink);
            let req = GenerateRequest {
                worker,
                contract,
                company,
                strict,
            };
            match generator.generate(&req) {
                Ok(report) => {
                    display::print_report(&report);
                    Ok(ExitCode::SUCCESS)
                }
                Err(GenerateError::Invalid { worker, contract }) => {
                    display::print_rejection(&worker, &contract);
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e).context("generating contract"),
            }
        }
        Command::Validate { file, kind } => Ok(ExitCode::from(run_validate(&file, kind.into()))),
    }
}

/// Validate one file and print the outcome. Returns the process status:
/// 0 when the record has no violations, 1 on violations or a load failure.
fn run_validate(file: &Path, kind: RecordKind) -> u8 {
    match validate_file(file, kind) {
        Ok(violations) => {
            display::print_validation(file, kind, &violations);
            if violations.is_empty() { 0 } else { 1 }
        }
        Err(e) => {
            eprintln!("failed to load {}: {e}", file.display());
            1
        }
    }
}
