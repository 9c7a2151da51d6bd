use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// What to print once the batch has been applied
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Report {
    /// The unspent outputs remaining after the batch
    #[default]
    Pool,
    /// The transactions accepted from the batch, in order
    Accepted,
}

/// Trait for reading configuration parameters
pub trait Config {
    fn pool_path(&self) -> &Path;
    fn transactions_path(&self) -> &Path;
    fn report(&self) -> Report;
}

/// CLI configuration
#[derive(Parser, Debug)]
#[command(
    name = "scrooge-ledger",
    about = "Validates a batch of transactions against an unspent output pool and applies the valid ones",
    version
)]
pub struct CliConfig {
    /// Path to the CSV file with the initial unspent outputs
    #[arg(value_name = "POOL_FILE")]
    pool_file: PathBuf,

    /// Path to the CSV file with the candidate transactions
    #[arg(value_name = "TX_FILE")]
    tx_file: PathBuf,

    /// Report to write to stdout
    #[arg(long, value_enum, default_value_t = Report::Pool)]
    report: Report,
}

impl Config for CliConfig {
    fn pool_path(&self) -> &Path {
        &self.pool_file
    }

    fn transactions_path(&self) -> &Path {
        &self.tx_file
    }

    fn report(&self) -> Report {
        self.report
    }
}
