//! # bookdb-core
//!
//! **Order book index and book subscriptions for a ledger server.**
//!
//! The index answers two questions against the latest closed ledger:
//!
//! - which order books exist for an issue, on either side, and whether an
//!   issue can be sold directly for the native asset;
//! - who should hear about a transaction that touched a given book.
//!
//! ## Data flow
//!
//! ```text
//! ledger close → BookIndex::update → snapshot swap → queries
//! accepted tx  → BookIndex::process_txn → BookListeners::publish_once → Subscriber::send
//! ```
//!
//! Reads are lock-free against an immutable [`BookSnapshot`]. Listener groups
//! live in a registry keyed by [`Book`](bookdb_types::Book) that is untouched by
//! rebuilds.

pub mod index;
pub mod listeners;
pub mod notify;
pub mod snapshot;

pub use index::{BookIndex, IndexStats};
pub use listeners::{BookListeners, Subscriber};
pub use notify::affected_books;
pub use snapshot::BookSnapshot;
