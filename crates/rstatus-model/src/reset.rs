//! Reset masks for full updates.
//!
//! A full update replaces a whole spec. Fields the client left at their
//! default value are not on the wire, so the server cannot tell "leave
//! alone" from "clear" without a reset mask naming them explicitly.

use std::collections::BTreeMap;

use rstatus_fieldmask::{FieldKey, Mask};

/// Computes the reset mask a full update of `self` must carry.
pub trait FullUpdateResetMask {
    fn full_update_reset_mask(&self) -> Mask;
}

/// Accumulates a reset mask field by field.
///
/// Rules:
/// - an unset field is reset as a whole (leaf)
/// - a set message contributes its own mask when non-empty
/// - an empty list or map resets every element (`name.*`)
/// - a non-empty list of messages resets the union of its elements' masks
///   under `name.*`
/// - non-empty lists and maps of scalars contribute nothing
#[derive(Debug, Default)]
pub struct ResetMaskBuilder {
    mask: Mask,
}

impl ResetMaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn leaf(mut self, name: &str) -> Self {
        self.mask.field_parts.insert(FieldKey::new(name), Mask::new());
        self
    }

    fn nested(mut self, name: &str, sub: Mask) -> Self {
        self.mask.field_parts.insert(FieldKey::new(name), sub);
        self
    }

    /// Scalar or enum field.
    pub fn scalar<T>(self, name: &str, value: &Option<T>) -> Self {
        match value {
            None => self.leaf(name),
            Some(_) => self,
        }
    }

    /// Singular message field.
    pub fn message<M: FullUpdateResetMask>(self, name: &str, value: &Option<M>) -> Self {
        match value {
            None => self.leaf(name),
            Some(message) => {
                let sub = message.full_update_reset_mask();
                if sub.is_empty() {
                    self
                } else {
                    self.nested(name, sub)
                }
            }
        }
    }

    /// Repeated scalar field.
    pub fn list<T>(self, name: &str, values: &[T]) -> Self {
        if values.is_empty() {
            self.nested(name, Mask::wildcard(Mask::new()))
        } else {
            self
        }
    }

    /// Repeated message field.
    pub fn messages<M: FullUpdateResetMask>(self, name: &str, values: &[M]) -> Self {
        let mut inner = Mask::new();
        for value in values {
            inner.merge(&value.full_update_reset_mask());
        }
        self.nested(name, Mask::wildcard(inner))
    }

    /// Map with scalar values.
    pub fn map<K, V>(self, name: &str, values: &BTreeMap<K, V>) -> Self {
        if values.is_empty() {
            self.nested(name, Mask::wildcard(Mask::new()))
        } else {
            self
        }
    }

    pub fn build(self) -> Mask {
        self.mask
    }
}

impl<T: FullUpdateResetMask> FullUpdateResetMask for Option<T> {
    fn full_update_reset_mask(&self) -> Mask {
        self.as_ref()
            .map(FullUpdateResetMask::full_update_reset_mask)
            .unwrap_or_default()
    }
}
