//! Fixed-width ledger identifiers and the composite [`Issue`] key.
//!
//! Currencies and accounts are both 160-bit opaque values. The all-zero value
//! of each is the sentinel for the ledger's native asset.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BookDbError, Result, constants};

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// 160-bit currency code.
///
/// Standard codes carry three ASCII characters at bytes 12..15 with every
/// other byte zero. The all-zero code is the native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct Currency(pub [u8; 20]);

impl Currency {
    /// The native asset sentinel.
    pub const NATIVE: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build a standard three-letter currency code.
    pub fn from_code(code: &str) -> Result<Self> {
        let raw = code.as_bytes();
        if raw.len() != 3 || !raw.iter().all(u8::is_ascii_alphanumeric) {
            return Err(BookDbError::InvalidCurrency {
                reason: format!("expected three ASCII alphanumerics, got {code:?}"),
            });
        }
        if code == constants::NATIVE_CURRENCY_CODE {
            return Err(BookDbError::InvalidCurrency {
                reason: format!("{code} is reserved for the native asset"),
            });
        }
        let mut bytes = [0u8; 20];
        bytes[12..15].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The three-letter code, if this is a standard currency.
    #[must_use]
    pub fn iso_code(&self) -> Option<&str> {
        let standard = self.0[..12].iter().all(|b| *b == 0)
            && self.0[15..].iter().all(|b| *b == 0)
            && self.0[12..15].iter().all(u8::is_ascii_alphanumeric);
        if standard {
            std::str::from_utf8(&self.0[12..15]).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            return write!(f, "{}", constants::NATIVE_CURRENCY_CODE);
        }
        match self.iso_code() {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "{}", hex::encode_upper(self.0)),
        }
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// 160-bit account identifier. Zero is the native issuer sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// The native issuer sentinel.
    pub const NATIVE: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// First four bytes in hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode_upper(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// One side of a tradable asset: a currency and the account that issues it.
///
/// This is the key of both side maps in the book index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Issue {
    pub currency: Currency,
    pub account: AccountId,
}

impl Issue {
    #[must_use]
    pub fn new(currency: Currency, account: AccountId) -> Self {
        Self { currency, account }
    }

    /// The native asset issued by the native sentinel account.
    #[must_use]
    pub fn native() -> Self {
        Self::new(Currency::NATIVE, AccountId::NATIVE)
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.currency.is_native()
    }

    /// Native currency must pair with the native account, and only with it.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.currency.is_native() == self.account.is_native()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "{}", self.currency)
        } else {
            write!(f, "{}/{}", self.currency, self.account.short())
        }
    }
}

// ---------------------------------------------------------------------------
// Hash256
// ---------------------------------------------------------------------------

/// 256-bit ledger index or transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// Ledger sequence number.
pub type LedgerSeq = u32;

#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// Random non-native account for tests.
    pub fn random() -> Self {
        let mut bytes: [u8; 20] = rand::random();
        bytes[0] |= 1;
        Self(bytes)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Issue {
    /// Shorthand for a standard-code issue in tests.
    pub fn iou(code: &str, account: AccountId) -> Self {
        Self::new(
            Currency::from_code(code).expect("test currency code must be valid"),
            account,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_layout() {
        let usd = Currency::from_code("USD").unwrap();
        assert_eq!(&usd.0[12..15], b"USD");
        assert!(usd.0[..12].iter().all(|b| *b == 0));
        assert_eq!(usd.iso_code(), Some("USD"));
        assert_eq!(usd.to_string(), "USD");
    }

    #[test]
    fn native_code_rejected() {
        assert!(matches!(
            Currency::from_code("XRP"),
            Err(BookDbError::InvalidCurrency { .. })
        ));
        assert!(Currency::from_code("US").is_err());
        assert!(Currency::from_code("U$D").is_err());
    }

    #[test]
    fn nonstandard_currency_displays_hex() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xAB;
        let c = Currency::from_bytes(bytes);
        assert_eq!(c.iso_code(), None);
        assert!(c.to_string().starts_with("AB00"));
    }

    #[test]
    fn native_issue() {
        let xrp = Issue::native();
        assert!(xrp.is_native());
        assert!(xrp.is_well_formed());
        assert_eq!(xrp.to_string(), "XRP");
    }

    #[test]
    fn malformed_issues() {
        let bank = AccountId::random();
        assert!(!Issue::new(Currency::NATIVE, bank).is_well_formed());
        let usd = Currency::from_code("USD").unwrap();
        assert!(!Issue::new(usd, AccountId::NATIVE).is_well_formed());
        assert!(Issue::new(usd, bank).is_well_formed());
    }

    #[test]
    fn issue_equality_is_by_both_parts() {
        let a = AccountId::random();
        let b = AccountId::random();
        assert_ne!(Issue::iou("USD", a), Issue::iou("USD", b));
        assert_ne!(Issue::iou("USD", a), Issue::iou("EUR", a));
        assert_eq!(Issue::iou("USD", a), Issue::iou("USD", a));
    }

    #[test]
    fn serde_roundtrip() {
        let issue = Issue::iou("EUR", AccountId::random());
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(issue, back);
    }
}
