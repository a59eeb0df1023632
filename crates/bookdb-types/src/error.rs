//! Error types for the BookDB order book index.
//!
//! All errors use the `OB_ERR_` prefix so they are easy to grep in logs.
//! Codes are grouped by subsystem:
//! - 1xx: Ledger source errors
//! - 2xx: Book / identifier errors
//! - 9xx: General errors
//!
//! Lookups never fail: absence is an empty result, not an error.

use thiserror::Error;

use crate::{Book, LedgerSeq};

/// Central error enum for all BookDB operations.
#[derive(Debug, Error)]
pub enum BookDbError {
    // =================================================================
    // Ledger Errors (1xx)
    // =================================================================
    /// The ledger's state could not be read during a rebuild.
    #[error("OB_ERR_100: Ledger {seq} unavailable: {reason}")]
    LedgerUnavailable { seq: LedgerSeq, reason: String },

    /// The index has been shut down and no longer accepts rebuilds.
    #[error("OB_ERR_101: Book index is shut down")]
    Shutdown,

    // =================================================================
    // Book Errors (2xx)
    // =================================================================
    /// A currency code could not be parsed.
    #[error("OB_ERR_200: Invalid currency: {reason}")]
    InvalidCurrency { reason: String },

    /// A book pairs a native currency with a non-native issuer (or vice versa),
    /// or trades an issue against itself.
    #[error("OB_ERR_201: Malformed book: {0}")]
    MalformedBook(Book),

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Configuration could not be parsed or is out of range.
    #[error("OB_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BookDbError>;

impl From<serde_json::Error> for BookDbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountId, Issue};

    #[test]
    fn ledger_unavailable_display() {
        let err = BookDbError::LedgerUnavailable {
            seq: 12,
            reason: "missing node".into(),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("OB_ERR_100"), "Got: {msg}");
        assert!(msg.contains("12"));
        assert!(msg.contains("missing node"));
    }

    #[test]
    fn malformed_book_display() {
        let book = Book::new(Issue::iou("USD", AccountId::random()), Issue::native());
        let msg = format!("{}", BookDbError::MalformedBook(book));
        assert!(msg.contains("OB_ERR_201"));
        assert!(msg.contains("USD"));
        assert!(msg.contains("XRP"));
    }

    #[test]
    fn all_errors_have_ob_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(BookDbError::Shutdown),
            Box::new(BookDbError::InvalidCurrency { reason: "x".into() }),
            Box::new(BookDbError::Configuration("bad".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("OB_ERR_"), "Error missing OB_ERR_ prefix: {msg}");
        }
    }
}
