//! Mask tree and set-like operations on it.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, FieldKey, FieldPath};

/// Tree of fields.
///
/// An empty sub-mask under a key is a leaf: the whole field is covered.
/// `any` applies to every field at its level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mask {
    pub any: Option<Box<Mask>>,
    pub field_parts: BTreeMap<FieldKey, Mask>,
}

impl Mask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask whose wildcard branch is `inner`.
    pub fn wildcard(inner: Mask) -> Self {
        Self {
            any: Some(Box::new(inner)),
            field_parts: BTreeMap::new(),
        }
    }

    /// Builder-style insert of a field branch.
    pub fn with_field(mut self, key: impl Into<FieldKey>, sub: Mask) -> Self {
        self.insert_merged(key.into(), sub);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.any.is_none() && self.field_parts.is_empty()
    }

    /// Convert a single-branch mask into a path. Empty masks give `None`.
    pub fn to_field_path(&self) -> Result<Option<FieldPath>, Error> {
        if self.any.is_some() {
            return Err(Error::Wildcard);
        }
        if self.field_parts.len() > 1 {
            return Err(Error::MultiplePaths);
        }
        let Some((key, sub)) = self.field_parts.iter().next() else {
            return Ok(None);
        };
        let mut path = FieldPath::from_keys([key.clone()]);
        if let Some(inner) = sub.to_field_path()? {
            path = path.join(inner.keys().iter().cloned());
        }
        Ok(Some(path))
    }

    pub fn is_field_path(&self) -> bool {
        self.to_field_path().is_ok()
    }

    /// Union `other` into this mask.
    pub fn merge(&mut self, other: &Mask) {
        if other.is_empty() {
            return;
        }
        if let Some(theirs) = other.any.as_deref() {
            match &mut self.any {
                Some(mine) => mine.merge(theirs),
                None => self.any = Some(Box::new(theirs.clone())),
            }
        }
        for (key, sub) in &other.field_parts {
            self.insert_merged(key.clone(), sub.clone());
        }
    }

    /// Union as a new mask.
    pub fn merged(&self, other: &Mask) -> Mask {
        let mut ret = self.clone();
        ret.merge(other);
        ret
    }

    fn insert_merged(&mut self, key: FieldKey, sub: Mask) {
        match self.field_parts.get_mut(&key) {
            Some(existing) => existing.merge(&sub),
            None => {
                self.field_parts.insert(key, sub);
            }
        }
    }

    /// Effective sub-mask for one key: its own branch plus the wildcard.
    pub fn sub_mask_for_key(&self, key: &FieldKey) -> Option<Mask> {
        match (self.field_parts.get(key), self.any.as_deref()) {
            (Some(part), Some(any)) => Some(part.merged(any)),
            (Some(part), None) => Some(part.clone()),
            (None, any) => any.cloned(),
        }
    }

    /// Effective sub-mask at the end of `path`, if the mask reaches it.
    pub fn sub_mask(&self, path: &FieldPath) -> Option<Mask> {
        path.keys()
            .iter()
            .try_fold(self.clone(), |mask, key| mask.sub_mask_for_key(key))
    }

    /// Normalized string form.
    pub fn marshal(&self) -> String {
        self.marshal_counted().1
    }

    fn marshal_counted(&self) -> (usize, String) {
        if self.is_empty() {
            return (0, String::new());
        }
        let mut entries = Vec::new();
        let mut push = |key: String, sub: &Mask| {
            let (count, inner) = sub.marshal_counted();
            entries.push(match count {
                0 => key,
                1 => format!("{}.{}", key, inner),
                _ => format!("{}.({})", key, inner),
            });
        };
        if let Some(any) = self.any.as_deref() {
            push("*".to_string(), any);
        }
        for (key, sub) in &self.field_parts {
            push(key.marshal(), sub);
        }
        entries.sort();
        (entries.len(), entries.join(","))
    }

    /// Parse the string form.
    pub fn unmarshal(source: &str) -> Result<Mask, Error> {
        crate::parser::parse(source)
    }

    /// Intersection under reset-mask semantics: wildcards on either side
    /// are expanded against the other side's named fields.
    pub fn intersect_reset_mask(&self, other: &Mask) -> Mask {
        let mut ret = Mask::new();
        if let Some(any) = self.any.as_deref() {
            ret.any = other
                .any
                .as_deref()
                .map(|theirs| Box::new(any.intersect_reset_mask(theirs)));
            for (key, sub) in &other.field_parts {
                ret.field_parts
                    .insert(key.clone(), any.intersect_reset_mask(sub));
            }
        }
        if let Some(theirs) = other.any.as_deref() {
            for (key, sub) in &self.field_parts {
                ret.insert_merged(key.clone(), theirs.intersect_reset_mask(sub));
            }
        }
        for (key, sub) in &self.field_parts {
            if let Some(theirs) = other.field_parts.get(key) {
                ret.insert_merged(key.clone(), sub.intersect_reset_mask(theirs));
            }
        }
        ret
    }

    /// Structural intersection; wildcards only meet wildcards.
    pub fn intersect_dumb(&self, other: &Mask) -> Mask {
        let mut ret = Mask::new();
        if let (Some(mine), Some(theirs)) = (self.any.as_deref(), other.any.as_deref()) {
            ret.any = Some(Box::new(mine.intersect_dumb(theirs)));
        }
        for (key, sub) in &self.field_parts {
            if let Some(theirs) = other.field_parts.get(key) {
                ret.field_parts.insert(key.clone(), sub.intersect_dumb(theirs));
            }
        }
        ret
    }

    /// Structural subtraction; wildcards only cancel wildcards.
    pub fn subtract_dumb(&mut self, other: &Mask) {
        let clear_any = match (self.any.as_deref_mut(), other.any.as_deref()) {
            (Some(mine), Some(theirs)) => {
                mine.subtract_dumb(theirs);
                mine.is_empty()
            }
            _ => false,
        };
        if clear_any {
            self.any = None;
        }
        self.field_parts.retain(|key, sub| match other.field_parts.get(key) {
            Some(theirs) => {
                sub.subtract_dumb(theirs);
                !sub.is_empty()
            }
            None => true,
        });
    }

    /// Subtraction under reset-mask semantics: the other side's wildcard
    /// is subtracted from every named field.
    pub fn subtract_reset_mask(&mut self, other: &Mask) {
        let clear_any = match (self.any.as_deref_mut(), other.any.as_deref()) {
            (Some(mine), Some(theirs)) => {
                mine.subtract_reset_mask(theirs);
                mine.is_empty()
            }
            (Some(mine), None) => mine.is_empty(),
            _ => false,
        };
        if clear_any {
            self.any = None;
        }
        self.field_parts.retain(|key, sub| {
            let named = other.field_parts.get(key);
            if other.any.is_none() && named.is_none() {
                return true;
            }
            if let Some(theirs) = other.any.as_deref() {
                sub.subtract_reset_mask(theirs);
            }
            if let Some(theirs) = named {
                sub.subtract_reset_mask(theirs);
            }
            !sub.is_empty()
        });
    }
}

impl AddAssign<&Mask> for Mask {
    fn add_assign(&mut self, other: &Mask) {
        self.merge(other);
    }
}

impl AddAssign<&FieldPath> for Mask {
    fn add_assign(&mut self, path: &FieldPath) {
        self.merge(&path.to_mask());
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl FromStr for Mask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mask::unmarshal(s)
    }
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.marshal())
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Mask::unmarshal(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(s: &str) -> Mask {
        Mask::unmarshal(s).unwrap()
    }

    #[test]
    fn test_merge_paths() {
        let mut m = FieldPath::from_keys(["spec", "max_size_bytes"]).to_mask();
        m += &FieldPath::from_keys(["spec", "versioning"]);
        assert_eq!(m.marshal(), "spec.(max_size_bytes,versioning)");
    }

    #[test]
    fn test_merge_wildcards() {
        let mut m = mask("*.a");
        m.merge(&mask("*.b,c"));
        assert_eq!(m.marshal(), "*.(a,b),c");
    }

    #[test]
    fn test_marshal_sorts_entries() {
        let m = Mask::new()
            .with_field("zeta", Mask::new())
            .with_field("alpha", Mask::new());
        assert_eq!(m.marshal(), "alpha,zeta");
    }

    #[test]
    fn test_marshal_empty() {
        assert_eq!(Mask::new().marshal(), "");
    }

    #[test]
    fn test_to_field_path() {
        let path = mask("a.b.c").to_field_path().unwrap().unwrap();
        assert_eq!(path, FieldPath::from_keys(["a", "b", "c"]));
        assert!(!mask("a.(b,c)").is_field_path());
        assert!(Mask::new().is_field_path());
    }

    #[test]
    fn test_sub_mask_includes_wildcard() {
        let m = mask("spec.(*.x,image.y)");
        let sub = m.sub_mask(&FieldPath::from_keys(["spec", "image"])).unwrap();
        assert_eq!(sub.marshal(), "x,y");

        let other = m.sub_mask(&FieldPath::from_keys(["spec", "disk"])).unwrap();
        assert_eq!(other.marshal(), "x");

        assert!(m.sub_mask(&FieldPath::from_keys(["status"])).is_none());
    }

    #[test]
    fn test_intersect_reset_mask_expands_wildcard() {
        let lhs = mask("*");
        let rhs = mask("spec.image,status");
        assert_eq!(lhs.intersect_reset_mask(&rhs).marshal(), "spec,status");
    }

    #[test]
    fn test_intersect_reset_mask_named() {
        let lhs = mask("spec.(image,args),labels");
        let rhs = mask("spec.image");
        assert_eq!(lhs.intersect_reset_mask(&rhs).marshal(), "spec.image");
    }

    #[test]
    fn test_intersect_dumb_ignores_one_sided_wildcard() {
        let lhs = mask("*,spec.image");
        let rhs = mask("spec.(image,args),status");
        assert_eq!(lhs.intersect_dumb(&rhs).marshal(), "spec.image");
    }

    #[test]
    fn test_subtract_dumb() {
        let mut m = mask("spec.(image,args),status");
        m.subtract_dumb(&mask("spec.image,status"));
        assert_eq!(m.marshal(), "spec.args");
    }

    #[test]
    fn test_subtract_dumb_keeps_deeper_branches() {
        let mut m = mask("spec.image");
        m.subtract_dumb(&mask("spec"));
        assert_eq!(m.marshal(), "spec.image");
    }

    #[test]
    fn test_subtract_reset_mask_with_wildcard() {
        let mut m = mask("spec.image,status.state");
        m.subtract_reset_mask(&mask("*.image"));
        assert_eq!(m.marshal(), "status.state");
    }

    #[test]
    fn test_serde_as_string() {
        let m = mask("spec.(image,args)");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"spec.(args,image)\"");
        let back: Mask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
