use thiserror::Error;

/// Why no tweet id could be read from a piece of embed markup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("markup contains no link")]
    NoAnchor,

    #[error("first link has no href")]
    MissingHref,

    #[error("last path segment {0:?} is not a number")]
    NotNumeric(String),
}

impl IdError {
    pub fn not_numeric(segment: impl Into<String>) -> Self {
        Self::NotNumeric(segment.into())
    }
}
