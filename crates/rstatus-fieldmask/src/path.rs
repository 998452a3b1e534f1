//! Field paths and their relation to masks.

use std::fmt;

use crate::{Error, FieldKey, Mask};

/// Ordered list of keys from the message root to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<FieldKey>);

impl FieldPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldKey>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[FieldKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, key: impl Into<FieldKey>) {
        self.0.push(key.into());
    }

    /// Path without its last key, or `None` for the root path.
    pub fn parent(&self) -> Option<FieldPath> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// New path with `keys` appended.
    pub fn join<I, K>(&self, keys: I) -> FieldPath
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldKey>,
    {
        let mut joined = self.clone();
        joined.0.extend(keys.into_iter().map(Into::into));
        joined
    }

    /// Mask with a single branch ending in a leaf.
    pub fn to_mask(&self) -> Mask {
        self.join_mask(Mask::new())
    }

    /// Mask with a single branch along this path, `tail` hung at its end.
    pub fn join_mask(&self, tail: Mask) -> Mask {
        self.0.iter().rev().fold(tail, |inner, key| {
            let mut outer = Mask::new();
            outer.field_parts.insert(key.clone(), inner);
            outer
        })
    }

    /// True if this path is a strict prefix of `other`.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// True if a reset mask covers this path.
    pub fn matches_reset_mask(&self, mask: Option<&Mask>) -> bool {
        reset_match(&self.0, mask).0
    }

    /// True if a reset mask covers this path and ends exactly on it.
    pub fn matches_reset_mask_final(&self, mask: Option<&Mask>) -> bool {
        let (matched, is_final) = reset_match(&self.0, mask);
        matched && is_final
    }

    /// True if a select mask covers this path. No mask selects everything.
    pub fn matches_select_mask(&self, mask: Option<&Mask>) -> bool {
        select_match(&self.0, mask).0
    }

    /// Select-mask match, plus `true` when the path reaches below one of the
    /// mask's leaves (the field is selected whole).
    pub fn matches_select_mask_inner(&self, mask: Option<&Mask>) -> (bool, bool) {
        select_match(&self.0, mask)
    }

    pub fn marshal(&self) -> String {
        self.to_mask().marshal()
    }

    /// Parse a single-path mask string. Empty input gives `None`.
    pub fn unmarshal(source: &str) -> Result<Option<FieldPath>, Error> {
        Mask::unmarshal(source)?.to_field_path()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl FromIterator<FieldKey> for FieldPath {
    fn from_iter<T: IntoIterator<Item = FieldKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn reset_match(keys: &[FieldKey], mask: Option<&Mask>) -> (bool, bool) {
    let Some(mask) = mask else {
        return (false, false);
    };
    let Some((key, rest)) = keys.split_first() else {
        return (true, mask.is_empty());
    };

    let mut matched = false;
    let mut is_final = false;
    if let Some(any) = mask.any.as_deref() {
        (matched, is_final) = reset_match(rest, Some(any));
    }
    if let Some(part) = mask.field_parts.get(key) {
        let (key_match, key_final) = reset_match(rest, Some(part));
        matched |= key_match;
        if key_match {
            is_final |= key_final;
        }
    }
    (matched, is_final)
}

fn select_match(keys: &[FieldKey], mask: Option<&Mask>) -> (bool, bool) {
    let mask = match mask {
        Some(mask) if !mask.is_empty() => mask,
        _ => return (true, !keys.is_empty()),
    };
    let Some((key, rest)) = keys.split_first() else {
        return (true, false);
    };

    let mut matched = false;
    let mut is_inner = false;
    if let Some(any) = mask.any.as_deref() {
        (matched, is_inner) = select_match(rest, Some(any));
    }
    if let Some(part) = mask.field_parts.get(key) {
        let (key_match, key_inner) = select_match(rest, Some(part));
        matched |= key_match;
        if key_match {
            is_inner |= key_inner;
        }
    }
    (matched, is_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> FieldPath {
        FieldPath::from_keys(keys.iter().copied())
    }

    #[test]
    fn test_to_mask_marshals_dotted() {
        assert_eq!(path(&["spec", "max_size_bytes"]).marshal(), "spec.max_size_bytes");
    }

    #[test]
    fn test_parent() {
        assert_eq!(path(&["a", "b"]).parent(), Some(path(&["a"])));
        assert_eq!(path(&["a"]).parent(), Some(FieldPath::new()));
        assert_eq!(FieldPath::new().parent(), None);
    }

    #[test]
    fn test_is_prefix_of_is_strict() {
        assert!(path(&["a"]).is_prefix_of(&path(&["a", "b"])));
        assert!(!path(&["a", "b"]).is_prefix_of(&path(&["a", "b"])));
        assert!(!path(&["b"]).is_prefix_of(&path(&["a", "b"])));
    }

    #[test]
    fn test_join_mask_hangs_tail() {
        let tail = path(&["x"]).to_mask();
        let mask = path(&["a", "b"]).join_mask(tail);
        assert_eq!(mask.marshal(), "a.b.x");
    }

    #[test]
    fn test_reset_mask_matching() {
        let mask = Mask::unmarshal("spec.(image,disk.*)").unwrap();

        assert!(path(&["spec", "image"]).matches_reset_mask(Some(&mask)));
        assert!(path(&["spec", "image"]).matches_reset_mask_final(Some(&mask)));
        assert!(path(&["spec", "disk", "size_bytes"]).matches_reset_mask_final(Some(&mask)));

        // `spec` itself is covered but the mask continues below it.
        assert!(path(&["spec"]).matches_reset_mask(Some(&mask)));
        assert!(!path(&["spec"]).matches_reset_mask_final(Some(&mask)));

        assert!(!path(&["spec", "args"]).matches_reset_mask(Some(&mask)));
        assert!(!path(&["spec"]).matches_reset_mask(None));
    }

    #[test]
    fn test_select_mask_matching() {
        let mask = Mask::unmarshal("status.state").unwrap();

        assert!(path(&["status", "state"]).matches_select_mask(Some(&mask)));
        assert!(path(&["status", "state", "deeper"]).matches_select_mask(Some(&mask)));
        assert!(path(&["status"]).matches_select_mask(Some(&mask)));
        assert!(!path(&["spec"]).matches_select_mask(Some(&mask)));

        assert!(path(&["anything"]).matches_select_mask(None));
    }

    #[test]
    fn test_select_mask_inner_flag() {
        let mask = Mask::unmarshal("status.state").unwrap();

        assert_eq!(path(&["status"]).matches_select_mask_inner(Some(&mask)), (true, false));
        assert_eq!(
            path(&["status", "state", "x"]).matches_select_mask_inner(Some(&mask)),
            (true, true)
        );
    }

    #[test]
    fn test_unmarshal_single_path() {
        assert_eq!(FieldPath::unmarshal("a.b").unwrap(), Some(path(&["a", "b"])));
        assert_eq!(FieldPath::unmarshal("").unwrap(), None);
        assert_eq!(FieldPath::unmarshal("a,b"), Err(Error::MultiplePaths));
        assert_eq!(FieldPath::unmarshal("a.*"), Err(Error::Wildcard));
    }
}
