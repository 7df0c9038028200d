//! # Document Numbering
//!
//! Human-readable numbers printed on bills and estimates.
//!
//! ## Format
//! ```text
//! ┌──────────────┬────────────┬──────────────────────────────┐
//! │  SaleType    │  Prefix    │  Sequence                    │
//! ├──────────────┼────────────┼──────────────────────────────┤
//! │  Bill        │  BILL      │  BILL-0001, BILL-0002, ...   │
//! │  Estimate    │  EST       │  EST-0001, EST-0002, ...     │
//! └──────────────┴────────────┴──────────────────────────────┘
//!
//! Zero-padded to 4 digits; past 9999 the number simply widens (BILL-10000).
//! ```
//!
//! The next number is derived from the highest sequence already issued for
//! the type (see `vastra-db`'s sale ledger), so the lookup must parse the
//! numeric suffix rather than compare strings.

use std::fmt;

use crate::types::SaleType;

/// A parsed `PREFIX-NNNN` document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentNumber {
    sale_type: SaleType,
    sequence: u32,
}

impl DocumentNumber {
    /// First number of a sequence (`BILL-0001`).
    pub const fn first(sale_type: SaleType) -> Self {
        DocumentNumber {
            sale_type,
            sequence: 1,
        }
    }

    /// The number following this one.
    pub const fn next(&self) -> Self {
        DocumentNumber {
            sale_type: self.sale_type,
            sequence: self.sequence.saturating_add(1),
        }
    }

    /// Number to issue after `last`, or the first one when nothing was issued yet.
    pub fn following(sale_type: SaleType, last: Option<&str>) -> Self {
        last.and_then(|text| Self::parse_for(sale_type, text))
            .map(|n| n.next())
            .unwrap_or_else(|| Self::first(sale_type))
    }

    /// Parses `BILL-0012` / `EST-7`. Returns `None` for anything else.
    ///
    /// ```rust
    /// use vastra_core::numbering::DocumentNumber;
    /// use vastra_core::types::SaleType;
    ///
    /// let n = DocumentNumber::parse("EST-0042").unwrap();
    /// assert_eq!(n.sale_type(), SaleType::Estimate);
    /// assert_eq!(n.sequence(), 42);
    /// assert!(DocumentNumber::parse("INV-0001").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        SaleType::ALL
            .iter()
            .find_map(|sale_type| Self::parse_for(*sale_type, text))
    }

    fn parse_for(sale_type: SaleType, text: &str) -> Option<Self> {
        let digits = text
            .trim()
            .strip_prefix(sale_type.prefix())?
            .strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let sequence = digits.parse().ok()?;
        Some(DocumentNumber {
            sale_type,
            sequence,
        })
    }

    pub const fn sale_type(&self) -> SaleType {
        self.sale_type
    }

    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.sale_type.prefix(), self.sequence)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
