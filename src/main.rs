mod config;
mod records;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliConfig, Config, Report};
use records::{AcceptedRecord, UtxoRecord};
use std::io;
use tracing::{debug, info};
use utxo_ledger::{handler::TxHandler, pool::UtxoPool, transaction::Transaction};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CliConfig::parse();

    process_transactions(&config)?;

    info!("Processing completed successfully");

    Ok(())
}

fn process_transactions<C: Config>(config: &C) -> Result<()> {
    let mut pool_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(config.pool_path())
        .context("Failed to open pool file")?;
    let pool: UtxoPool = records::read_pool(&mut pool_reader).into_iter().collect();

    info!("Loaded {} unspent outputs", pool.len());

    let mut tx_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(config.transactions_path())
        .context("Failed to open transactions file")?;
    let candidates = records::read_transactions(&mut tx_reader);
    let submitted = candidates.len();

    let mut handler = TxHandler::new(&pool);
    let accepted = apply_candidates(&mut handler, candidates);

    info!(
        "Accepted {} of {submitted} transactions, {} unspent outputs remain",
        accepted.len(),
        handler.pool().len()
    );

    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::WriterBuilder::new().from_writer(handle);

    write_report(&mut writer, config.report(), handler.pool(), &accepted)?;

    writer.flush().context("Failed to flush stdout")?;

    Ok(())
}

/// Applies labelled candidates in order, keeping the label of every accepted one.
fn apply_candidates(
    handler: &mut TxHandler,
    candidates: Vec<(u32, Transaction)>,
) -> Vec<(u32, Transaction)> {
    candidates
        .into_iter()
        .filter(|(label, tx)| match handler.handle_tx(tx) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Rejected transaction {label}: {reason}");
                false
            }
        })
        .collect()
}

fn write_report<W: io::Write>(
    writer: &mut csv::Writer<W>,
    report: Report,
    pool: &UtxoPool,
    accepted: &[(u32, Transaction)],
) -> Result<()> {
    match report {
        Report::Pool => {
            let mut entries: Vec<_> = pool.iter().collect();
            entries.sort_by_key(|(id, _)| **id);

            for (id, output) in entries {
                writer
                    .serialize(UtxoRecord::new(id, output))
                    .context("Failed to serialize unspent output")?;
            }
        }
        Report::Accepted => {
            for (label, tx) in accepted {
                let record = AcceptedRecord {
                    tx: *label,
                    hash: tx.hash().to_string(),
                };
                writer
                    .serialize(&record)
                    .context("Failed to serialize accepted transaction")?;
            }
        }
    }

    Ok(())
}
