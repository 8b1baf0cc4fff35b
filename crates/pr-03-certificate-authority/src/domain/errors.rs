//! # Domain Errors

use thiserror::Error;

/// Certificate authority errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// The username cannot be used as a common name.
    #[error("invalid username '{username}': {reason}")]
    InvalidUsername {
        /// Rejected username
        username: String,
        /// Rule that was broken
        reason: String,
    },

    /// A valid certificate for this name is already on record.
    #[error("a valid certificate for {0} already exists")]
    AlreadyIssued(String),

    /// No valid certificate for this name is on record.
    #[error("no valid certificate for {0} exists")]
    NotIssued(String),

    /// Reading or writing the PKI directory failed.
    #[error("PKI storage error at {path}: {reason}")]
    Storage {
        /// File or directory involved
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// A line of `index.txt` could not be parsed.
    #[error("corrupt certificate index at line {line}: {reason}")]
    CorruptIndex {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Key generation, parsing or signing failed.
    #[error("certificate operation failed: {0}")]
    Crypto(String),
}

impl From<rcgen::Error> for AuthorityError {
    fn from(err: rcgen::Error) -> Self {
        AuthorityError::Crypto(err.to_string())
    }
}
