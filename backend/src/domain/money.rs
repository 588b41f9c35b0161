//! Fixed-point currency amounts.
//!
//! All ledger arithmetic runs on integer minor units (franc CFA amounts have
//! no subunit, so one minor unit is one franc). Floats never appear in money
//! paths; sums saturate at the i64 boundary rather than wrapping.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A non-negative currency amount in minor units.
///
/// ## Invariants
/// - The wrapped value is never negative.
///
/// # Examples
/// ```
/// use backend::domain::Amount;
///
/// let amount = Amount::new(5_000).expect("non-negative");
/// assert_eq!(amount.minor_units(), 5_000);
/// assert!(Amount::new(-1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = i64, example = 5000)]
pub struct Amount(i64);

/// Validation failures raised when constructing an [`Amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountValidationError {
    /// The supplied value was below zero.
    #[error("amount must not be negative, got {0}")]
    Negative(i64),
}

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct an amount, rejecting negative values.
    pub const fn new(minor_units: i64) -> Result<Self, AmountValidationError> {
        if minor_units < 0 {
            Err(AmountValidationError::Negative(minor_units))
        } else {
            Ok(Self(minor_units))
        }
    }

    /// The raw value in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Whether this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add another amount, saturating at the i64 boundary.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract another amount, clamping the result at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0.saturating_sub(other.0);
        Self(if diff < 0 { 0 } else { diff })
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
