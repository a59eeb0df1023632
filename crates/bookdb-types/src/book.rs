//! Order book definitions.
//!
//! A [`Book`] is one trading direction: the taker pays `pays` and receives
//! `gets`. The same pair serves as the flat four-part key
//! (issuer pays, issuer gets, currency pays, currency gets) of the listener
//! registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::{Hash256, Issue, constants};

/// One tradable direction between two issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Book {
    /// What the taker pays (the offer owner receives).
    pub pays: Issue,
    /// What the taker gets (the offer owner gives up).
    pub gets: Issue,
}

impl Book {
    #[must_use]
    pub fn new(pays: Issue, gets: Issue) -> Self {
        Self { pays, gets }
    }

    /// The opposite direction of the same pair.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.gets, self.pays)
    }

    /// Both sides well-formed and distinct.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.pays.is_well_formed() && self.gets.is_well_formed() && self.pays != self.gets
    }

    /// Base index of this book's quality directories.
    ///
    /// First half of SHA-512 over the book-directory space prefix and the
    /// four identifiers, with the low 64 bits cleared. Those bits hold the
    /// quality of each individual directory.
    #[must_use]
    pub fn directory_base(&self) -> Hash256 {
        let mut hasher = Sha512::new();
        hasher.update(constants::BOOK_DIR_SPACE.to_be_bytes());
        hasher.update(self.pays.currency.as_bytes());
        hasher.update(self.gets.currency.as_bytes());
        hasher.update(self.pays.account.as_bytes());
        hasher.update(self.gets.account.as_bytes());
        let digest = hasher.finalize();

        let mut base = [0u8; 32];
        base[..24].copy_from_slice(&digest[..24]);
        Hash256(base)
    }

    /// Index of the directory at a given quality within this book.
    #[must_use]
    pub fn quality_index(&self, quality: u64) -> Hash256 {
        let mut index = self.directory_base();
        index.0[24..].copy_from_slice(&quality.to_be_bytes());
        index
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.pays, self.gets)
    }
}

// ---------------------------------------------------------------------------
// OrderBook
// ---------------------------------------------------------------------------

/// An order book known to exist in a ledger snapshot.
///
/// Shared between the by-pays and by-gets maps of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub book: Book,
    pub directory_base: Hash256,
}

impl OrderBook {
    #[must_use]
    pub fn new(book: Book) -> Self {
        Self {
            directory_base: book.directory_base(),
            book,
        }
    }

    #[must_use]
    pub fn taker_pays(&self) -> &Issue {
        &self.book.pays
    }

    #[must_use]
    pub fn taker_gets(&self) -> &Issue {
        &self.book.gets
    }

    /// True if the taker receives the native asset from this book.
    #[must_use]
    pub fn is_to_native(&self) -> bool {
        self.book.gets.is_native()
    }
}
