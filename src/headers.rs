//! Request metadata headers
//!
//! Ordered multimap of gRPC-style headers with case-insensitive keys.
//! Keys are stored lowercased.

use std::fmt;

use rstatus_model::FullUpdateResetMask;

/// Header carrying the reset mask of a full update
pub const RESET_MASK_HEADER: &str = "X-ResetMask";

/// Ordered key/value headers; a key may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.entries.push((key.to_lowercase(), value.into()));
    }

    /// Insert an entry at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, key: &str, value: impl Into<String>) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, (key.to_lowercase(), value.into()));
    }

    /// All values for `key`, in insertion order.
    pub fn get(&self, key: &str) -> Vec<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Last value for `key`, or the first one when `first` is set.
    pub fn get_one(&self, key: &str, first: bool) -> Option<&str> {
        let values = self.get(key);
        if first {
            values.first().copied()
        } else {
            values.last().copied()
        }
    }

    /// Replace every value of `key` with `values`.
    pub fn set<I, V>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.remove(key);
        for value in values {
            self.add(key, value);
        }
    }

    /// Remove every entry for `key`, returning how many were removed.
    pub fn remove(&mut self, key: &str) -> usize {
        let key = key.to_lowercase();
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        before - self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.add(key.as_ref(), value);
        }
        metadata
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// Add the full-update reset mask of `message` unless the caller already
/// set one.
pub fn ensure_reset_mask<M: FullUpdateResetMask>(message: &M, metadata: &mut Metadata) {
    if !metadata.contains(RESET_MASK_HEADER) {
        let mask = message.full_update_reset_mask();
        metadata.set(RESET_MASK_HEADER, [mask.marshal()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstatus_model::{CapacityIntervalSpec, JobSpec};

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut md = Metadata::new();
        md.add("X-Request-Id", "abc");
        md.add("x-request-id", "def");

        assert_eq!(md.get("X-REQUEST-ID"), vec!["abc", "def"]);
        assert_eq!(md.get_one("x-request-id", false), Some("def"));
        assert_eq!(md.get_one("x-request-id", true), Some("abc"));
        assert_eq!(md.iter().next(), Some(("x-request-id", "abc")));
    }

    #[test]
    fn test_set_replaces_all_values() {
        let mut md: Metadata = [("a", "1"), ("b", "2"), ("A", "3")].into_iter().collect();
        md.set("a", ["9"]);

        assert_eq!(md.get("a"), vec!["9"]);
        assert_eq!(md.len(), 2);
        // replaced values move to the end
        assert_eq!(md.iter().last(), Some(("a", "9")));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut md = Metadata::new();
        md.add("b", "2");
        md.insert(0, "A", "1");
        md.insert(99, "c", "3");

        let keys: Vec<&str> = md.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        assert_eq!(md.remove("B"), 1);
        assert!(!md.contains("b"));
        assert_eq!(md.remove("missing"), 0);
        assert_eq!(md.get_one("missing", false), None);
    }

    #[test]
    fn test_ensure_reset_mask_adds_header() {
        let spec = CapacityIntervalSpec {
            quantity: Some(4),
            ..Default::default()
        };
        let mut md = Metadata::new();
        ensure_reset_mask(&spec, &mut md);

        assert_eq!(
            md.get_one(RESET_MASK_HEADER, false),
            Some("capacity_block_group_id,end_time,start_time")
        );
        assert_eq!(md.iter().next().map(|(k, _)| k), Some("x-resetmask"));
    }

    #[test]
    fn test_ensure_reset_mask_keeps_existing_header() {
        let mut md = Metadata::new();
        md.add("x-resetmask", "image");
        ensure_reset_mask(&JobSpec::default(), &mut md);

        assert_eq!(md.get(RESET_MASK_HEADER), vec!["image"]);
    }

    #[test]
    fn test_display() {
        let md: Metadata = [("X-ResetMask", "args.*")].into_iter().collect();
        assert_eq!(md.to_string(), "x-resetmask: args.*\n");
    }
}
