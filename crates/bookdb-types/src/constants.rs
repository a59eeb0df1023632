//! System-wide constants for the BookDB order book index.

/// Display code of the native asset. Never valid as an issued currency.
pub const NATIVE_CURRENCY_CODE: &str = "XRP";

/// Ledger space prefix for book directories (`'B'`).
pub const BOOK_DIR_SPACE: u16 = 0x0042;

/// Default minimum ledger sequence distance that triggers a rebuild.
/// One means any different ledger rebuilds the index.
pub const DEFAULT_MIN_REBUILD_GAP: u32 = 1;

/// Default starting capacity of the side maps of a fresh snapshot.
pub const DEFAULT_BUCKET_CAPACITY: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
