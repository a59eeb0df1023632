//! # bookdb-types
//!
//! Shared types, errors, and configuration for the **BookDB** order book index.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Currency`], [`AccountId`], [`Hash256`], [`LedgerSeq`]
//! - **Composite key**: [`Issue`] (currency + issuer)
//! - **Book model**: [`Book`], [`OrderBook`]
//! - **Ledger adapters**: [`LedgerSource`], [`DirectoryPage`]
//! - **Transaction adapters**: [`AcceptedTransaction`], [`AffectedNode`], [`OfferFields`]
//! - **Configuration**: [`IndexConfig`]
//! - **Errors**: [`BookDbError`] with `OB_ERR_` prefix codes
//! - **Constants**: native sentinel, ledger space prefixes, defaults

pub mod book;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;

pub use book::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;

// Constants are accessed via `bookdb_types::constants::FOO`.
