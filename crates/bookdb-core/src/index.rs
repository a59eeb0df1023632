//! The order book index and its listener registry.
//!
//! ## Snapshots
//!
//! Readers load the current [`BookSnapshot`] through an `ArcSwap` and never
//! take a lock. Writers (`setup`, `update`, `add_order_book`, `invalidate`,
//! `shutdown`) serialize on a writer mutex, build a replacement snapshot off
//! to the side and publish it in one store. A reader therefore sees exactly
//! one ledger's book set, never a mix of two rebuilds.
//!
//! ## Invalidation
//!
//! `invalidate` publishes an empty, non-authoritative snapshot: queries return
//! empty results and [`BookIndex::current_seq`] is `None` until the next
//! successful rebuild. `add_order_book` is a no-op against an invalidated
//! index, so no book becomes visible before a ledger vouches for it.
//!
//! ## Shutdown
//!
//! After `shutdown`, every writer and `make_book_listeners` fail with
//! [`BookDbError::Shutdown`]. Queries keep answering, with empty results.
//!
//! ## Listeners
//!
//! The registry maps each [`Book`] to one shared [`BookListeners`] group. It
//! is independent of snapshots, so subscriptions survive rebuilds. A group
//! reference is obtained under the registry lock; publishing then only takes
//! the group's own lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use arc_swap::ArcSwap;
use bookdb_types::{
    AcceptedTransaction, Book, BookDbError, IndexConfig, Issue, LedgerSeq, LedgerSource,
    OrderBook, Result,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::listeners::BookListeners;
use crate::notify::affected_books;
use crate::snapshot::BookSnapshot;

/// Point-in-time counters for logs and admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub seq: Option<LedgerSeq>,
    pub books: usize,
    pub native_books: usize,
    pub listener_groups: usize,
    pub built_at: DateTime<Utc>,
}

/// Index of the order books in the current ledger, plus book subscriptions.
#[derive(Debug)]
pub struct BookIndex {
    config: IndexConfig,
    snapshot: ArcSwap<BookSnapshot>,
    writer: Mutex<()>,
    listeners: Mutex<HashMap<Book, Arc<BookListeners>>>,
    shut_down: AtomicBool,
}

impl BookIndex {
    /// Create an empty, non-authoritative index.
    ///
    /// Fails with [`BookDbError::Configuration`] if `config` is out of range.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: IndexConfig) -> Self {
        Self {
            config,
            snapshot: ArcSwap::from_pointee(BookSnapshot::empty()),
            writer: Mutex::new(()),
            listeners: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    // =================================================================
    // Lifecycle
    // =================================================================

    /// Full rebuild from `ledger`.
    ///
    /// If the ledger cannot be read the current snapshot stays in place.
    pub fn setup<L: LedgerSource + ?Sized>(&self, ledger: &L) -> Result<()> {
        let _writer = self.writer.lock();
        self.rebuild(ledger)
    }

    /// Rebuild if `ledger` is far enough from the indexed one.
    ///
    /// Returns whether a rebuild happened. A non-authoritative index always
    /// rebuilds.
    pub fn update<L: LedgerSource + ?Sized>(&self, ledger: &L) -> Result<bool> {
        let _writer = self.writer.lock();
        if self.is_shut_down() {
            return Err(BookDbError::Shutdown);
        }

        let seq = ledger.seq();
        if let Some(indexed) = self.snapshot.load().seq() {
            if seq.abs_diff(indexed) < self.config.min_rebuild_gap {
                tracing::debug!(seq, indexed, "Book index already current");
                return Ok(false);
            }
        }

        self.rebuild(ledger)?;
        Ok(true)
    }

    /// Mark the index non-authoritative until the next rebuild.
    pub fn invalidate(&self) {
        let _writer = self.writer.lock();
        let previous = self.snapshot.swap(Arc::new(BookSnapshot::invalidated()));
        tracing::info!(previous_seq = ?previous.seq(), "Book index invalidated");
    }

    /// Tear down: drop every snapshot and listener group. Later rebuilds fail
    /// with [`BookDbError::Shutdown`].
    pub fn shutdown(&self) {
        let _writer = self.writer.lock();
        self.shut_down.store(true, Ordering::Release);
        self.snapshot.store(Arc::new(BookSnapshot::invalidated()));
        let groups = {
            let mut registry = self.listeners.lock();
            let n = registry.len();
            registry.clear();
            n
        };
        tracing::info!(groups, "Book index shut down");
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn rebuild<L: LedgerSource + ?Sized>(&self, ledger: &L) -> Result<()> {
        if self.is_shut_down() {
            return Err(BookDbError::Shutdown);
        }

        let started = Instant::now();
        let seq = ledger.seq();
        let pages = ledger.offer_directories().inspect_err(|err| {
            tracing::warn!(seq, error = %err, "Book index rebuild failed; keeping previous snapshot");
        })?;

        let (next, malformed) =
            BookSnapshot::from_pages(seq, &pages, self.config.initial_bucket_capacity);
        if malformed > 0 {
            tracing::warn!(seq, malformed, "Skipped malformed order book directories");
        }

        let books = next.book_count();
        let native_books = next.native_book_count();
        self.snapshot.store(Arc::new(next));

        tracing::info!(
            seq,
            pages = pages.len(),
            books,
            native_books,
            close_time = ?ledger.close_time(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Book index rebuilt"
        );
        Ok(())
    }

    // =================================================================
    // Book registration
    // =================================================================

    /// Add one book to the live index.
    ///
    /// Returns `false` if the book was already present, or if the index is
    /// invalidated and waiting for its next rebuild.
    pub fn add_order_book(&self, book: Book) -> Result<bool> {
        if self.is_shut_down() {
            return Err(BookDbError::Shutdown);
        }
        if !book.is_well_formed() {
            tracing::warn!(%book, "Rejected malformed order book");
            return Err(BookDbError::MalformedBook(book));
        }

        let _writer = self.writer.lock();
        if self.is_shut_down() {
            return Err(BookDbError::Shutdown);
        }
        let current = self.snapshot.load_full();
        if current.is_invalidated() {
            tracing::debug!(%book, "Index invalidated; order book not added");
            return Ok(false);
        }
        if current.contains(&book) {
            return Ok(false);
        }

        let mut next = BookSnapshot::clone(&current);
        next.insert(book)?;
        self.snapshot.store(Arc::new(next));
        tracing::debug!(%book, "Order book added");
        Ok(true)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// The snapshot currently served. Hold it to run several queries against
    /// the same ledger.
    #[must_use]
    pub fn snapshot(&self) -> Arc<BookSnapshot> {
        self.snapshot.load_full()
    }

    /// Books whose taker pays `issue` (the issue a path would spend).
    #[must_use]
    pub fn books_by_taker_pays(&self, issue: &Issue) -> Vec<Arc<OrderBook>> {
        self.snapshot.load().books_by_taker_pays(issue)
    }

    /// Books whose taker gets `issue`.
    #[must_use]
    pub fn books_by_taker_gets(&self, issue: &Issue) -> Vec<Arc<OrderBook>> {
        self.snapshot.load().books_by_taker_gets(issue)
    }

    /// Does a book exist that takes `issue` and gives the native asset?
    ///
    /// A book with the native asset on its taker-pays side does not count.
    #[must_use]
    pub fn is_book_to_native(&self, issue: &Issue) -> bool {
        self.snapshot.load().is_book_to_native(issue)
    }

    #[must_use]
    pub fn current_seq(&self) -> Option<LedgerSeq> {
        self.snapshot.load().seq()
    }

    /// False after `invalidate` and before the first rebuild.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.snapshot.load().is_authoritative()
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot.load();
        IndexStats {
            seq: snapshot.seq(),
            books: snapshot.book_count(),
            native_books: snapshot.native_book_count(),
            listener_groups: self.listeners.lock().len(),
            built_at: snapshot.built_at(),
        }
    }

    // =================================================================
    // Listener registry
    // =================================================================

    /// The listener group for `book`, if one was ever made.
    #[must_use]
    pub fn book_listeners(&self, book: &Book) -> Option<Arc<BookListeners>> {
        self.listeners.lock().get(book).cloned()
    }

    /// The listener group for `book`, created on first use.
    pub fn make_book_listeners(&self, book: Book) -> Result<Arc<BookListeners>> {
        let mut registry = self.listeners.lock();
        if self.is_shut_down() {
            return Err(BookDbError::Shutdown);
        }
        let group = registry.entry(book).or_insert_with(|| {
            tracing::debug!(%book, "Created book listener group");
            Arc::new(BookListeners::new(book, self.config.prune_dead_on_publish))
        });
        Ok(Arc::clone(group))
    }

    /// Drop groups with no live subscribers that nobody else holds.
    /// Returns how many were removed.
    pub fn prune_listeners(&self) -> usize {
        let mut registry = self.listeners.lock();
        let before = registry.len();
        registry.retain(|_, group| Arc::strong_count(group) > 1 || group.live_count() > 0);
        let removed = before - registry.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = registry.len(), "Pruned book listener groups");
        }
        removed
    }

    // =================================================================
    // Transaction fan-out
    // =================================================================

    /// Publish `message` to the subscribers of every book `tx` touched.
    ///
    /// Each subscriber receives the message at most once even when it
    /// follows several of the touched books. Returns deliveries made.
    pub fn process_txn<L: LedgerSource + ?Sized>(
        &self,
        ledger: &L,
        tx: &AcceptedTransaction,
        message: &Value,
    ) -> usize {
        if tx.ledger_seq != ledger.seq() {
            tracing::warn!(
                tx = %tx.hash,
                tx_seq = tx.ledger_seq,
                ledger_seq = ledger.seq(),
                "Transaction ledger does not match publishing ledger"
            );
        }

        let books = affected_books(tx);
        if books.is_empty() {
            return 0;
        }

        let mut published = HashSet::new();
        let mut delivered = 0;
        for book in &books {
            if let Some(group) = self.book_listeners(book) {
                delivered += group.publish_once(message, &mut published);
            }
        }

        tracing::debug!(
            tx = %tx.hash,
            seq = ledger.seq(),
            books = books.len(),
            delivered,
            "Transaction published to book listeners"
        );
        delivered
    }
}

impl Default for BookIndex {
    fn default() -> Self {
        Self::with_config(IndexConfig::default())
    }
}
