use crate::amount::Amount;
use crate::crypto::{self, Address, CryptoError, Signature};
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("input index {index} out of range for {len} inputs")]
    InputOutOfRange { index: usize, len: usize },
    #[error("{0} outputs exceed the addressable maximum of {max}", max = u32::MAX)]
    TooManyOutputs(usize),
}

/// Content hash identifying a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crypto::decode_fixed::<32>(s).map(Self)
    }
}

/// Identifies an output by the transaction that produced it and its position there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtxoId {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl UtxoId {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    pub signature: Option<Signature>,
}

impl Input {
    pub const fn utxo_id(&self) -> UtxoId {
        UtxoId::new(self.prev_tx_hash, self.output_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub address: Address,
    pub value: Amount,
}

impl Output {
    pub const fn new(address: Address, value: Amount) -> Self {
        Self { address, value }
    }
}

/// A finalized transaction. Its hash is fixed at construction, so there are no mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    hash: TxHash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Transaction {
    pub const fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Bytes the owner of the output spent by input `index` must sign.
    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        self.inputs
            .get(index)
            .map(|input| signing_payload(input, &self.outputs))
    }

    /// Ids of the outputs this transaction creates, in output order.
    pub fn output_ids(&self) -> impl Iterator<Item = UtxoId> + '_ {
        (0..=u32::MAX)
            .zip(&self.outputs)
            .map(|(index, _)| UtxoId::new(self.hash, index))
    }
}

fn signing_payload(input: &Input, outputs: &[Output]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(36 + outputs.len() * 40);
    payload.extend_from_slice(input.prev_tx_hash.as_bytes());
    payload.extend_from_slice(&input.output_index.to_be_bytes());

    for output in outputs {
        payload.extend_from_slice(&output.value.minor_units().to_be_bytes());
        payload.extend_from_slice(output.address.as_bytes());
    }

    payload
}

fn content_hash(inputs: &[Input], outputs: &[Output]) -> TxHash {
    let mut hasher = Sha256::new();

    for input in inputs {
        hasher.update(input.prev_tx_hash.as_bytes());
        hasher.update(input.output_index.to_be_bytes());
        if let Some(signature) = &input.signature {
            hasher.update(signature.to_bytes());
        }
    }

    for output in outputs {
        hasher.update(output.value.minor_units().to_be_bytes());
        hasher.update(output.address.as_bytes());
    }

    TxHash(hasher.finalize().into())
}

/// Assembles inputs and outputs, signs inputs, then hashes into a [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, prev_tx_hash: TxHash, output_index: u32) -> Self {
        self.inputs.push(Input {
            prev_tx_hash,
            output_index,
            signature: None,
        });
        self
    }

    pub fn output(mut self, address: Address, value: Amount) -> Self {
        self.outputs.push(Output::new(address, value));
        self
    }

    /// Payload for input `index` given the outputs added so far.
    ///
    /// Add every output before signing; a later output changes the payload
    /// and invalidates earlier signatures.
    pub fn signing_payload(&self, index: usize) -> Result<Vec<u8>, TransactionError> {
        let input = self
            .inputs
            .get(index)
            .ok_or(TransactionError::InputOutOfRange {
                index,
                len: self.inputs.len(),
            })?;

        Ok(signing_payload(input, &self.outputs))
    }

    pub fn signature(
        mut self,
        index: usize,
        signature: Signature,
    ) -> Result<Self, TransactionError> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(TransactionError::InputOutOfRange { index, len })?;

        input.signature = Some(signature);
        Ok(self)
    }

    pub fn sign(self, index: usize, key: &SigningKey) -> Result<Self, TransactionError> {
        let signature = crypto::sign(key, &self.signing_payload(index)?);
        self.signature(index, signature)
    }

    /// Hashes the transaction. Fails if an output index would not fit in a [`UtxoId`],
    /// so a transaction holds at most `u32::MAX` outputs.
    pub fn finalize(self) -> Result<Transaction, TransactionError> {
        check_output_count(self.outputs.len())?;
        let hash = content_hash(&self.inputs, &self.outputs);

        Ok(Transaction {
            hash,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }
}

fn check_output_count(len: usize) -> Result<(), TransactionError> {
    match u32::try_from(len) {
        Ok(_) => Ok(()),
        Err(_) => Err(TransactionError::TooManyOutputs(len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    #[test]
    fn test_hash_depends_on_contents() {
        let owner = Address::from(&key(1));
        let a = TransactionBuilder::new()
            .output(owner, Amount::from_coins(10).unwrap())
            .finalize()
            .unwrap();
        let b = TransactionBuilder::new()
            .output(owner, Amount::from_coins(11).unwrap())
            .finalize()
            .unwrap();
        let a_again = TransactionBuilder::new()
            .output(owner, Amount::from_coins(10).unwrap())
            .finalize()
            .unwrap();

        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a_again.hash());
    }

    #[test]
    fn test_signature_covers_outputs() {
        let owner = key(1);
        let genesis = TransactionBuilder::new()
            .output(Address::from(&owner), Amount::from_coins(10).unwrap())
            .finalize()
            .unwrap();

        let tx = TransactionBuilder::new()
            .input(genesis.hash(), 0)
            .output(Address::from(&key(2)), Amount::from_coins(10).unwrap())
            .sign(0, &owner)
            .unwrap()
            .finalize()
            .unwrap();

        let signature = tx.inputs()[0].signature.unwrap();
        let payload = tx.signing_payload(0).unwrap();
        assert!(crypto::verify_signature(
            &Address::from(&owner),
            &payload,
            &signature
        ));

        let redirected = TransactionBuilder::new()
            .input(genesis.hash(), 0)
            .output(Address::from(&key(3)), Amount::from_coins(10).unwrap())
            .finalize()
            .unwrap();
        assert!(!crypto::verify_signature(
            &Address::from(&owner),
            &redirected.signing_payload(0).unwrap(),
            &signature
        ));
    }

    #[test]
    fn test_sign_out_of_range() {
        let result = TransactionBuilder::new().sign(0, &key(1));
        assert!(matches!(
            result,
            Err(TransactionError::InputOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_output_ids() {
        let owner = Address::from(&key(1));
        let tx = TransactionBuilder::new()
            .output(owner, Amount::from_coins(1).unwrap())
            .output(owner, Amount::from_coins(2).unwrap())
            .finalize()
            .unwrap();

        let ids: Vec<_> = tx.output_ids().collect();
        assert_eq!(
            ids,
            vec![UtxoId::new(tx.hash(), 0), UtxoId::new(tx.hash(), 1)]
        );
        assert!(tx.signing_payload(0).is_none());
    }

    #[test]
    fn test_output_count_limit() {
        assert!(check_output_count(u32::MAX as usize).is_ok());

        let oversize = u32::MAX as usize + 1;
        assert!(matches!(
            check_output_count(oversize),
            Err(TransactionError::TooManyOutputs(len)) if len == oversize
        ));
    }

    #[test]
    fn test_tx_hash_hex() {
        let hash = TxHash::new([0xab; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(32));
        assert_eq!(hash.to_string().parse::<TxHash>().unwrap(), hash);
    }
}
