use crate::amount::Amount;
use crate::crypto;
use crate::pool::UtxoPool;
use crate::transaction::{Transaction, UtxoId};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a candidate transaction was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("input spends {0}, which is not in the pool")]
    MissingOutput(UtxoId),
    #[error("input {input} has a missing or invalid signature")]
    InvalidSignature { input: usize },
    #[error("output {0} is spent more than once")]
    DuplicateInput(UtxoId),
    #[error("output {output} has a negative value")]
    NegativeOutputValue { output: usize },
    #[error("outputs total {outputs} minor units but inputs only {inputs}")]
    ValueNotConserved { inputs: i128, outputs: i128 },
}

/// Checks `tx` against `pool` without modifying it.
///
/// Rules run in order: every spent output exists, every input is signed by
/// the owner of the output it spends, no output is spent twice, no output
/// value is negative, and inputs cover outputs. Any surplus is burned.
pub fn validate(tx: &Transaction, pool: &UtxoPool) -> Result<(), RejectReason> {
    let mut spent = Vec::with_capacity(tx.inputs().len());
    for input in tx.inputs() {
        let id = input.utxo_id();
        let output = pool.get(&id).map_err(|_| RejectReason::MissingOutput(id))?;
        spent.push(*output);
    }

    for (index, (input, output)) in tx.inputs().iter().zip(&spent).enumerate() {
        let authentic = match (&input.signature, tx.signing_payload(index)) {
            (Some(signature), Some(payload)) => {
                crypto::verify_signature(&output.address, &payload, signature)
            }
            _ => false,
        };

        if !authentic {
            return Err(RejectReason::InvalidSignature { input: index });
        }
    }

    let mut seen = HashSet::with_capacity(tx.inputs().len());
    for input in tx.inputs() {
        let id = input.utxo_id();
        if !seen.insert(id) {
            return Err(RejectReason::DuplicateInput(id));
        }
    }

    if let Some(output) = tx.outputs().iter().position(|o| o.value.is_negative()) {
        return Err(RejectReason::NegativeOutputValue { output });
    }

    let inputs = Amount::total(spent.iter().map(|o| o.value));
    let outputs = Amount::total(tx.outputs().iter().map(|o| o.value));
    if inputs < outputs {
        return Err(RejectReason::ValueNotConserved { inputs, outputs });
    }

    Ok(())
}

/// Applies batches of transactions to a privately owned pool of unspent outputs.
#[derive(Debug, Clone, Default)]
pub struct TxHandler {
    pool: UtxoPool,
}

impl TxHandler {
    /// Creates a handler over a copy of `pool`. The caller's pool is never modified.
    pub fn new(pool: &UtxoPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub fn check(&self, tx: &Transaction) -> Result<(), RejectReason> {
        validate(tx, &self.pool)
    }

    pub fn is_valid(&self, tx: &Transaction) -> bool {
        self.check(tx).is_ok()
    }

    /// Validates `tx` against the live pool and applies it when valid.
    pub fn handle_tx(&mut self, tx: &Transaction) -> Result<(), RejectReason> {
        self.check(tx)?;
        self.apply(tx);

        Ok(())
    }

    /// Validates candidates in order against the live pool, applying each valid one
    /// before the next is checked. Returns the accepted transactions in input order.
    ///
    /// A later candidate may spend outputs created earlier in the same batch, and of
    /// two candidates spending the same output only the first is accepted.
    pub fn handle_txs<I>(&mut self, candidates: I) -> Vec<Transaction>
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut accepted = Vec::new();

        for tx in candidates {
            if let Err(reason) = self.handle_tx(&tx) {
                debug!(tx = %tx.hash(), %reason, "Rejected transaction");
                continue;
            }

            trace!(tx = %tx.hash(), "Accepted transaction");
            accepted.push(tx);
        }

        accepted
    }

    pub const fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    fn apply(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            self.pool.remove(&input.utxo_id());
        }

        for (id, output) in tx.output_ids().zip(tx.outputs()) {
            self.pool.insert(id, *output);
        }
    }
}
