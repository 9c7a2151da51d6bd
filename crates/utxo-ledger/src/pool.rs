use crate::transaction::{Output, UtxoId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("output {0} is not in the pool")]
    NotFound(UtxoId),
}

/// Unspent transaction outputs keyed by the id of the output.
///
/// `Clone` produces an independent copy; mutating it never affects the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<UtxoId, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.utxos.contains_key(id)
    }

    pub fn get(&self, id: &UtxoId) -> Result<&Output, PoolError> {
        self.utxos.get(id).ok_or(PoolError::NotFound(*id))
    }

    /// Adds `output` under `id`, returning the record it replaced, if any.
    pub fn insert(&mut self, id: UtxoId, output: Output) -> Option<Output> {
        self.utxos.insert(id, output)
    }

    /// Removes `id` from the pool. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: &UtxoId) -> Option<Output> {
        self.utxos.remove(id)
    }

    /// All ids currently in the pool, in no particular order.
    pub fn all(&self) -> Vec<UtxoId> {
        self.utxos.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UtxoId, &Output)> {
        self.utxos.iter()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

impl FromIterator<(UtxoId, Output)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (UtxoId, Output)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::crypto::Address;
    use crate::transaction::TxHash;
    use ed25519_dalek::SigningKey;

    fn output(value: i64) -> Output {
        Output::new(
            Address::from(&SigningKey::from_bytes(&[1u8; 32])),
            Amount::from_coins(value).unwrap(),
        )
    }

    fn id(seed: u8, index: u32) -> UtxoId {
        UtxoId::new(TxHash::new([seed; 32]), index)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut pool = UtxoPool::new();
        assert!(pool.insert(id(1, 0), output(10)).is_none());

        assert!(pool.contains(&id(1, 0)));
        assert!(!pool.contains(&id(1, 1)));
        assert_eq!(pool.get(&id(1, 0)).unwrap().value, Amount::from_coins(10).unwrap());

        assert_eq!(pool.remove(&id(1, 0)), Some(output(10)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_get_missing() {
        let pool = UtxoPool::new();
        assert_eq!(pool.get(&id(1, 0)), Err(PoolError::NotFound(id(1, 0))));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut pool: UtxoPool = [(id(1, 0), output(10))].into_iter().collect();
        assert_eq!(pool.remove(&id(2, 0)), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut pool = UtxoPool::new();
        pool.insert(id(1, 0), output(10));
        assert_eq!(pool.insert(id(1, 0), output(20)), Some(output(10)));
        assert_eq!(pool.get(&id(1, 0)).unwrap().value, Amount::from_coins(20).unwrap());
    }

    #[test]
    fn test_key_uses_both_fields() {
        let pool: UtxoPool = [(id(1, 0), output(10))].into_iter().collect();
        assert!(!pool.contains(&id(1, 1)));
        assert!(!pool.contains(&id(2, 0)));
    }

    #[test]
    fn test_all() {
        let pool: UtxoPool = [(id(1, 0), output(1)), (id(1, 1), output(2))]
            .into_iter()
            .collect();

        let mut ids = pool.all();
        ids.sort();
        assert_eq!(ids, vec![id(1, 0), id(1, 1)]);
    }

    #[test]
    fn test_clone_is_independent() {
        let original: UtxoPool = [(id(1, 0), output(10))].into_iter().collect();
        let mut copy = original.clone();

        copy.remove(&id(1, 0));
        copy.insert(id(2, 0), output(5));

        assert!(original.contains(&id(1, 0)));
        assert!(!original.contains(&id(2, 0)));
        assert_eq!(original.len(), 1);
    }
}
