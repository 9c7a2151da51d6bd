use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use ed25519_dalek::Signature;

#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("bytes are not a valid ed25519 public key")]
    InvalidPublicKey,
}

/// Recipient identity of an output: the ed25519 public key allowed to spend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(VerifyingKey);

impl Address {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        Self(key)
    }
}

impl From<&SigningKey> for Address {
    fn from(key: &SigningKey) -> Self {
        Self(key.verifying_key())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode_fixed::<32>(s)?)
    }
}

/// Parses a hex-encoded 64 byte ed25519 signature.
pub fn parse_signature(s: &str) -> Result<Signature, CryptoError> {
    Ok(Signature::from_bytes(&decode_fixed::<64>(s)?))
}

pub fn sign(key: &SigningKey, payload: &[u8]) -> Signature {
    key.sign(payload)
}

/// Returns whether `signature` is a valid signature over `payload` by `address`.
pub fn verify_signature(address: &Address, payload: &[u8], signature: &Signature) -> bool {
    address.0.verify(payload, signature).is_ok()
}

pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(s)?;
    let actual = bytes.len();

    bytes.try_into().map_err(|_| CryptoError::Length {
        expected: N,
        actual,
    })
}
