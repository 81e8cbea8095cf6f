//! Classification enums for adjustments and expiry risk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown enum value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Kind of stock-affecting event recorded in the adjustment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "inventory.adjustment_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentCategory {
    /// A new batch was received.
    Restock,
    /// Units were drawn from batches in expiry order.
    Consumption,
    /// The aggregate was set directly, bypassing batches.
    Correction,
    /// A batch was removed before being consumed.
    Deletion,
}

impl AdjustmentCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Restock,
        Self::Consumption,
        Self::Correction,
        Self::Deletion,
    ];

    /// Stable lowercase name used in JSON and SQL.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Restock => "restock",
            Self::Consumption => "consumption",
            Self::Correction => "correction",
            Self::Deletion => "deletion",
        }
    }
}

impl std::fmt::Display for AdjustmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdjustmentCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("adjustment category", s))
    }
}

/// How close a batch is to its expiry date.
///
/// Bands are for presentation and alerting only; the engine never branches
/// on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBand {
    /// Expires within 7 days.
    Critical,
    /// Expires in 8 to 15 days.
    Urgent,
    /// Expires in 16 to 30 days.
    Caution,
}

impl ExpiryBand {
    /// Last day (inclusive) of the critical band.
    pub const CRITICAL_DAYS: i64 = 7;
    /// Last day (inclusive) of the urgent band.
    pub const URGENT_DAYS: i64 = 15;
    /// Last day (inclusive) of the caution band.
    pub const CAUTION_DAYS: i64 = 30;

    /// Classify a batch by the number of days left until it expires.
    ///
    /// Already-expired batches (negative days) are critical. Anything further
    /// out than the caution band has no band.
    #[must_use]
    pub const fn classify(days_until_expiry: i64) -> Option<Self> {
        if days_until_expiry <= Self::CRITICAL_DAYS {
            Some(Self::Critical)
        } else if days_until_expiry <= Self::URGENT_DAYS {
            Some(Self::Urgent)
        } else if days_until_expiry <= Self::CAUTION_DAYS {
            Some(Self::Caution)
        } else {
            None
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Urgent => "urgent",
            Self::Caution => "caution",
        }
    }
}

impl std::fmt::Display for ExpiryBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
