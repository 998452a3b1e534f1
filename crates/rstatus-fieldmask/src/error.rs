//! Error types for field mask handling.

/// Errors produced while building, parsing, or converting masks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A single key could not be parsed from its marshalled form.
    #[error("malformed field key: {0}")]
    MalformedKey(String),

    /// The mask string is not valid mask syntax.
    #[error("{summary} {context}")]
    Parse {
        /// Short description of the problem.
        summary: String,
        /// Character offset of the offending token.
        position: usize,
        /// Human-readable snippet around `position`.
        context: String,
    },

    /// Input ended where a field, wildcard, or group was expected.
    #[error("unexpected end of mask")]
    UnexpectedEnd,

    /// A mask with a wildcard cannot be expressed as a single path.
    #[error("wildcard in the mask")]
    Wildcard,

    /// A mask with more than one branch cannot be expressed as a single path.
    #[error("multiple paths in the mask")]
    MultiplePaths,
}

impl Error {
    /// Position of a parse error, if this is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}
