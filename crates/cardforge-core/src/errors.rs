use thiserror::Error;

/// Errors emitted by the card synthesis engine.
#[derive(Debug, Error)]
pub enum CardError {
    /// A caller-supplied argument failed a shape or digit-class check.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    /// The prefix leaves no room for random digits and the check digit.
    #[error("prefix {prefix} is too long for a {length}-digit card")]
    PrefixTooLong { prefix: String, length: usize },
    /// A brand, country, or prefix filter matched no catalog entry.
    #[error("no BINs found for {0}")]
    NoMatchingBin(String),
    /// The catalog has no metadata for this BIN.
    #[error("no information found for BIN {0}")]
    UnknownBin(String),
    /// The reference dataset could not be turned into a catalog.
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CardError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CardError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, CardError>;
