//! Immutable view of the order books in one ledger.
//!
//! A snapshot is filled while private to its builder and never mutated after
//! it is published to readers. Every [`OrderBook`] appears in exactly one
//! by-pays bucket and one by-gets bucket.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bookdb_types::{Book, BookDbError, DirectoryPage, Issue, LedgerSeq, OrderBook, Result};
use chrono::{DateTime, Utc};

/// The book set of one ledger, indexed by both sides.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    /// Ledger the snapshot reflects. `None` when non-authoritative.
    seq: Option<LedgerSeq>,
    /// Published by `invalidate`; stays empty until replaced by a rebuild.
    invalidated: bool,
    built_at: DateTime<Utc>,
    by_pays: HashMap<Issue, Vec<Arc<OrderBook>>>,
    by_gets: HashMap<Issue, Vec<Arc<OrderBook>>>,
    /// Taker-pays issues with a book whose taker-gets side is native.
    native_books: HashSet<Issue>,
    books: HashSet<Book>,
}

impl BookSnapshot {
    /// A non-authoritative snapshot holding no books.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_capacity(0)
    }

    /// The empty snapshot served between `invalidate` and the next rebuild.
    #[must_use]
    pub fn invalidated() -> Self {
        Self {
            invalidated: true,
            ..Self::empty()
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seq: None,
            invalidated: false,
            built_at: Utc::now(),
            by_pays: HashMap::with_capacity(capacity),
            by_gets: HashMap::with_capacity(capacity),
            native_books: HashSet::new(),
            books: HashSet::with_capacity(capacity),
        }
    }

    /// Build from a ledger's directory pages. Non-root pages are ignored;
    /// malformed books are skipped and counted.
    pub(crate) fn from_pages(
        seq: LedgerSeq,
        pages: &[DirectoryPage],
        capacity: usize,
    ) -> (Self, usize) {
        let mut snapshot = Self::with_capacity(capacity);
        let mut malformed = 0;
        for page in pages.iter().filter(|p| p.is_book_root()) {
            if snapshot.insert(page.book()).is_err() {
                malformed += 1;
            }
        }
        snapshot.mark_built(seq);
        (snapshot, malformed)
    }

    /// Add a book to both side maps. Returns `false` if already present.
    pub(crate) fn insert(&mut self, book: Book) -> Result<bool> {
        if !book.is_well_formed() {
            return Err(BookDbError::MalformedBook(book));
        }
        if !self.books.insert(book) {
            return Ok(false);
        }

        let entry = Arc::new(OrderBook::new(book));
        self.by_pays
            .entry(book.pays)
            .or_default()
            .push(Arc::clone(&entry));
        self.by_gets.entry(book.gets).or_default().push(entry);

        if book.gets.is_native() {
            self.native_books.insert(book.pays);
        }
        Ok(true)
    }

    pub(crate) fn mark_built(&mut self, seq: LedgerSeq) {
        self.seq = Some(seq);
        self.built_at = Utc::now();
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn seq(&self) -> Option<LedgerSeq> {
        self.seq
    }

    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.seq.is_some()
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Books whose taker pays `issue`.
    #[must_use]
    pub fn books_by_taker_pays(&self, issue: &Issue) -> Vec<Arc<OrderBook>> {
        self.by_pays.get(issue).cloned().unwrap_or_default()
    }

    /// Books whose taker gets `issue`.
    #[must_use]
    pub fn books_by_taker_gets(&self, issue: &Issue) -> Vec<Arc<OrderBook>> {
        self.by_gets.get(issue).cloned().unwrap_or_default()
    }

    /// Is there a book taking `issue` and giving the native asset?
    #[must_use]
    pub fn is_book_to_native(&self, issue: &Issue) -> bool {
        self.native_books.contains(issue)
    }

    #[must_use]
    pub fn contains(&self, book: &Book) -> bool {
        self.books.contains(book)
    }

    #[must_use]
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn native_book_count(&self) -> usize {
        self.native_books.len()
    }

    /// Every book in the snapshot, in no particular order.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }
}

impl Default for BookSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
