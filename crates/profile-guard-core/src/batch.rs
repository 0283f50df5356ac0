//! Write batches: the unit of atomic mutation.

use bytes::Bytes;

use crate::types::DataKey;

/// An ordered set of key/value writes applied all-or-nothing.
///
/// Writing the same key twice keeps the first position and the last value,
/// so a planner may overwrite its own earlier writes. An empty value
/// deletes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    entries: Vec<(DataKey, Bytes)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch holding one write.
    pub fn single(key: DataKey, value: impl Into<Bytes>) -> Self {
        let mut batch = Self::new();
        batch.put(key, value);
        batch
    }

    /// Build from parallel key/value lists. Returns `None` on unequal lengths.
    pub fn from_parallel(keys: &[DataKey], values: &[Bytes]) -> Option<Self> {
        if keys.len() != values.len() {
            return None;
        }
        let mut batch = Self::new();
        for (key, value) in keys.iter().zip(values) {
            batch.put(*key, value.clone());
        }
        Some(batch)
    }

    /// Stage a write.
    pub fn put(&mut self, key: DataKey, value: impl Into<Bytes>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Stage a deletion.
    pub fn delete(&mut self, key: DataKey) -> &mut Self {
        self.put(key, Bytes::new())
    }

    /// Append every write of `other`, later writes winning.
    pub fn extend(&mut self, other: WriteBatch) -> &mut Self {
        for (key, value) in other.entries {
            self.put(key, value);
        }
        self
    }

    /// The staged value for `key`, if any.
    pub fn get(&self, key: &DataKey) -> Option<&Bytes> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DataKey, Bytes)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DataKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Split into parallel key and value lists.
    pub fn into_parts(self) -> (Vec<DataKey>, Vec<Bytes>) {
        self.entries.into_iter().unzip()
    }
}

impl IntoIterator for WriteBatch {
    type Item = (DataKey, Bytes);
    type IntoIter = std::vec::IntoIter<(DataKey, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins_in_place() {
        let a = DataKey::from_bytes([1; 32]);
        let b = DataKey::from_bytes([2; 32]);

        let mut batch = WriteBatch::new();
        batch.put(a, vec![1u8]).put(b, vec![2u8]).put(a, vec![3u8]);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get(&a).unwrap().as_ref(), &[3u8]);
        let (keys, _) = batch.into_parts();
        assert_eq!(keys, vec![a, b]);
    }

    #[test]
    fn test_from_parallel_length_mismatch() {
        let keys = [DataKey::from_bytes([1; 32])];
        assert!(WriteBatch::from_parallel(&keys, &[]).is_none());
    }

    #[test]
    fn test_delete_is_empty_value() {
        let a = DataKey::from_bytes([9; 32]);
        let batch = {
            let mut b = WriteBatch::new();
            b.delete(a);
            b
        };
        assert!(batch.get(&a).unwrap().is_empty());
    }
}
