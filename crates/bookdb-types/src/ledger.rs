//! Adapter types for the ledger and transaction layers.
//!
//! The index never reads ledger storage directly. A [`LedgerSource`] hands it
//! the offer directory pages of one closed ledger, and an
//! [`AcceptedTransaction`] describes which offers a validated transaction
//! touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Book, Hash256, Issue, LedgerSeq, Result};

// ---------------------------------------------------------------------------
// Ledger side
// ---------------------------------------------------------------------------

/// One page of an offer directory as stored in the ledger.
///
/// A book owns one directory per quality, and each directory may span many
/// pages. Only the root page of a quality directory carries an exchange rate
/// and has `index == root_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryPage {
    pub index: Hash256,
    pub root_index: Hash256,
    pub taker_pays: Issue,
    pub taker_gets: Issue,
    pub exchange_rate: Option<u64>,
}

impl DirectoryPage {
    /// Root page of the quality directory for `book` at `quality`.
    #[must_use]
    pub fn root(book: Book, quality: u64) -> Self {
        let index = book.quality_index(quality);
        Self {
            index,
            root_index: index,
            taker_pays: book.pays,
            taker_gets: book.gets,
            exchange_rate: Some(quality),
        }
    }

    /// Does this page define an order book on its own?
    #[must_use]
    pub fn is_book_root(&self) -> bool {
        self.exchange_rate.is_some() && self.index == self.root_index
    }

    #[must_use]
    pub fn book(&self) -> Book {
        Book::new(self.taker_pays, self.taker_gets)
    }
}

/// A closed ledger the index can rebuild from.
pub trait LedgerSource {
    /// Sequence number of this ledger.
    fn seq(&self) -> LedgerSeq;

    /// Every offer directory page in the ledger's state.
    fn offer_directories(&self) -> Result<Vec<DirectoryPage>>;

    fn close_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Transaction side
// ---------------------------------------------------------------------------

/// Engine result of an applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxResult {
    Success,
    /// Claimed a fee but did not apply (e.g. `tecUNFUNDED_OFFER`).
    Failed(String),
}

/// How a ledger entry was affected by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeAction {
    Created,
    Modified,
    Deleted,
}

/// Ledger entry kinds relevant to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntryType {
    Offer,
    DirectoryNode,
    AccountRoot,
    TrustLine,
    Other,
}

/// Offer amounts' issues as recorded in transaction metadata.
///
/// The adapter fills these from the new fields of a created offer, the
/// previous fields of a modified one and the final fields of a deleted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferFields {
    pub taker_pays: Issue,
    pub taker_gets: Issue,
}

/// One entry touched by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedNode {
    pub action: NodeAction,
    pub entry_type: LedgerEntryType,
    pub fields: Option<OfferFields>,
}

impl AffectedNode {
    /// An offer node touching `book`.
    #[must_use]
    pub fn offer(action: NodeAction, book: Book) -> Self {
        Self {
            action,
            entry_type: LedgerEntryType::Offer,
            fields: Some(OfferFields {
                taker_pays: book.pays,
                taker_gets: book.gets,
            }),
        }
    }
}

/// A validated transaction and the ledger entries it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTransaction {
    pub hash: Hash256,
    pub ledger_seq: LedgerSeq,
    pub result: TxResult,
    pub affected: Vec<AffectedNode>,
}

impl AcceptedTransaction {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result == TxResult::Success
    }
}

// ---------------------------------------------------------------------------
// In-memory ledger (tests)
// ---------------------------------------------------------------------------

/// A ledger held entirely in memory.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    pub seq: LedgerSeq,
    pub pages: Vec<DirectoryPage>,
    /// When set, `offer_directories` fails with this reason.
    pub unreadable: Option<String>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl MemoryLedger {
    pub fn new(seq: LedgerSeq) -> Self {
        Self {
            seq,
            ..Self::default()
        }
    }

    /// Ledger with one root directory per book.
    pub fn with_books(seq: LedgerSeq, books: &[Book]) -> Self {
        let mut ledger = Self::new(seq);
        for book in books {
            ledger.add_book(*book, 1);
        }
        ledger
    }

    /// Add `qualities` root directories (plus one continuation page each).
    pub fn add_book(&mut self, book: Book, qualities: u64) {
        for q in 0..qualities {
            let root = DirectoryPage::root(book, 1_000 + q);
            let mut next = root.clone();
            next.index.0[0] ^= 0xFF;
            next.exchange_rate = None;
            self.pages.push(root);
            self.pages.push(next);
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl LedgerSource for MemoryLedger {
    fn seq(&self) -> LedgerSeq {
        self.seq
    }

    fn offer_directories(&self) -> Result<Vec<DirectoryPage>> {
        match &self.unreadable {
            Some(reason) => Err(crate::BookDbError::LedgerUnavailable {
                seq: self.seq,
                reason: reason.clone(),
            }),
            None => Ok(self.pages.clone()),
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AcceptedTransaction {
    /// Successful transaction touching the given offer books.
    pub fn touching(ledger_seq: LedgerSeq, books: &[(NodeAction, Book)]) -> Self {
        Self {
            hash: Hash256(rand::random()),
            ledger_seq,
            result: TxResult::Success,
            affected: books
                .iter()
                .map(|(action, book)| AffectedNode::offer(*action, *book))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountId;

    fn usd_to_native() -> Book {
        Book::new(Issue::iou("USD", AccountId::random()), Issue::native())
    }

    #[test]
    fn root_page_defines_book() {
        let book = usd_to_native();
        let page = DirectoryPage::root(book, 42);
        assert!(page.is_book_root());
        assert_eq!(page.book(), book);
    }

    #[test]
    fn continuation_page_is_not_root() {
        let book = usd_to_native();
        let mut page = DirectoryPage::root(book, 42);
        page.index.0[0] ^= 1;
        assert!(!page.is_book_root());

        let mut rateless = DirectoryPage::root(book, 42);
        rateless.exchange_rate = None;
        assert!(!rateless.is_book_root());
    }

    #[test]
    fn memory_ledger_pages() {
        let book = usd_to_native();
        let mut ledger = MemoryLedger::new(7);
        ledger.add_book(book, 3);
        let pages = ledger.offer_directories().unwrap();
        assert_eq!(pages.len(), 6);
        assert_eq!(pages.iter().filter(|p| p.is_book_root()).count(), 3);
        assert_eq!(ledger.seq(), 7);
    }

    #[test]
    fn unreadable_ledger_errors() {
        let mut ledger = MemoryLedger::new(9);
        ledger.unreadable = Some("missing state node".into());
        let err = ledger.offer_directories().unwrap_err();
        assert!(err.to_string().contains("missing state node"));
    }

    #[test]
    fn transaction_success_flag() {
        let mut tx = AcceptedTransaction::touching(5, &[(NodeAction::Created, usd_to_native())]);
        assert!(tx.is_success());
        tx.result = TxResult::Failed("tecUNFUNDED_OFFER".into());
        assert!(!tx.is_success());
    }
}
