//! Discount percentage value object.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Basis points in one hundred percent.
const FULL: u32 = 10_000;

/// Error returned for a percentage outside `(0%, 100%]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Percentage must be between 0.01% and 100%, got {basis_points} basis points")]
pub struct PercentageError {
    pub basis_points: u32,
}

/// A discount percentage with two decimal places of precision.
///
/// Stored as basis points: 1250 is 12.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from whole percent points (e.g. 15 = 15%).
    pub fn from_percent(percent: u32) -> Result<Self, PercentageError> {
        Self::from_basis_points(percent.saturating_mul(100))
    }

    /// Creates a percentage from basis points (e.g. 1250 = 12.5%).
    pub fn from_basis_points(basis_points: u32) -> Result<Self, PercentageError> {
        if basis_points == 0 || basis_points > FULL {
            return Err(PercentageError { basis_points });
        }
        Ok(Self(basis_points))
    }

    /// Returns the value in basis points.
    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Returns the value as a fractional percent (12.5 for 1250 basis points).
    pub fn as_percent(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<u32> for Percentage {
    type Error = PercentageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_basis_points(value)
    }
}

impl From<Percentage> for u32 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}
