//! Field masks
//!
//! A mask is a tree of field names with an optional wildcard branch at every
//! level. Masks travel as strings in a compact syntax:
//!
//! - paths are dot-separated: `spec.disk.size_bytes`
//! - alternatives are comma-separated: `spec.image,spec.args`
//! - parentheses group a sub-mask: `spec.(image,args)`
//! - `*` selects every field at its level: `spec.volumes.*`
//! - keys outside `[a-zA-Z0-9_]` are JSON-quoted: `labels."team/owner"`
//!
//! The marshalled form is normalized (entries sorted, single-entry sub-masks
//! written without parentheses), so `Mask::unmarshal(&m.marshal()) == m`.

mod error;
mod key;
mod mask;
mod parser;
mod path;

pub use error::Error;
pub use key::FieldKey;
pub use mask::Mask;
pub use parser::parse;
pub use path::FieldPath;
