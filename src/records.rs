use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tracing::warn;
use utxo_ledger::{
    crypto,
    transaction::{Output, Transaction, TransactionBuilder, TxHash, UtxoId},
    Address, Amount,
};

/// Unspent output row, used for both the genesis pool input and the pool report
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UtxoRecord {
    pub tx_hash: String,
    pub index: u32,
    pub address: String,
    pub amount: Decimal,
}

impl UtxoRecord {
    pub fn new(id: &UtxoId, output: &Output) -> Self {
        Self {
            tx_hash: id.tx_hash.to_string(),
            index: id.index,
            address: output.address.to_string(),
            amount: output.value.to_decimal(),
        }
    }

    pub fn into_entry(self) -> Result<(UtxoId, Output)> {
        let tx_hash: TxHash = self.tx_hash.parse().context("Invalid tx_hash")?;
        let address: Address = self.address.parse().context("Invalid address")?;
        let value = Amount::try_from(self.amount)?;

        Ok((UtxoId::new(tx_hash, self.index), Output::new(address, value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Input,
    Output,
}

/// One input or output of a candidate transaction
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    pub tx: u32,
    pub kind: RowKind,
    #[serde(default)]
    pub prev_hash: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Accepted transaction row for the `accepted` report
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRecord {
    pub tx: u32,
    pub hash: String,
}

pub fn read_pool<R: io::Read>(reader: &mut csv::Reader<R>) -> Vec<(UtxoId, Output)> {
    let mut entries = Vec::new();

    for result in reader.deserialize::<UtxoRecord>() {
        match result.map_err(anyhow::Error::from).and_then(UtxoRecord::into_entry) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping unspent output: {e:#}"),
        }
    }

    entries
}

/// Groups rows by their `tx` label, in order of first appearance, and builds one
/// transaction per group. A group with any malformed row is dropped entirely.
pub fn read_transactions<R: io::Read>(reader: &mut csv::Reader<R>) -> Vec<(u32, Transaction)> {
    let mut groups: Vec<(u32, Vec<TransactionRow>)> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for result in reader.deserialize::<TransactionRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Failed to parse transaction row: {e}");

                continue;
            }
        };

        let position = *positions.entry(row.tx).or_insert_with(|| {
            groups.push((row.tx, Vec::new()));
            groups.len() - 1
        });
        groups[position].1.push(row);
    }

    groups
        .into_iter()
        .filter_map(|(label, rows)| match build_transaction(&rows) {
            Ok(tx) => Some((label, tx)),
            Err(e) => {
                warn!("Skipping transaction {label}: {e:#}");
                None
            }
        })
        .collect()
}

fn build_transaction(rows: &[TransactionRow]) -> Result<Transaction> {
    let mut builder = TransactionBuilder::new();
    let mut signatures = Vec::new();

    for row in rows {
        match row.kind {
            RowKind::Input => {
                let prev_hash: TxHash = row
                    .prev_hash
                    .as_deref()
                    .ok_or_else(|| anyhow!("Input requires prev_hash"))?
                    .parse()
                    .context("Invalid prev_hash")?;
                let index = row.index.ok_or_else(|| anyhow!("Input requires index"))?;
                let signature = row
                    .signature
                    .as_deref()
                    .map(crypto::parse_signature)
                    .transpose()
                    .context("Invalid signature")?;

                builder = builder.input(prev_hash, index);
                signatures.push(signature);
            }
            RowKind::Output => {
                let address: Address = row
                    .address
                    .as_deref()
                    .ok_or_else(|| anyhow!("Output requires address"))?
                    .parse()
                    .context("Invalid address")?;
                let amount = row.amount.ok_or_else(|| anyhow!("Output requires amount"))?;

                builder = builder.output(address, Amount::try_from(amount)?);
            }
        }
    }

    for (index, signature) in signatures.into_iter().enumerate() {
        if let Some(signature) = signature {
            builder = builder.signature(index, signature)?;
        }
    }

    Ok(builder.finalize()?)
}
