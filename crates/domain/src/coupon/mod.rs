//! Coupon aggregate and related types.

mod aggregate;
mod rules;

pub use aggregate::{Coupon, CouponTerms};
pub use rules::{CouponCode, CouponRules};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{DomainEvent, Percentage};
use thiserror::Error;

use crate::CouponId;

/// Errors that can occur during coupon operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// Code is not 3 to 32 letters, digits, `-` or `_`.
    #[error("Invalid coupon code: {code:?}")]
    InvalidCode { code: String },

    /// Validity window is empty.
    #[error("Coupon validity window is empty: valid_from must be before valid_until")]
    InvalidWindow,

    /// Usage limit of zero.
    #[error("Usage limit must be greater than 0")]
    InvalidUsageLimit,

    /// Usage limit set below the number of redemptions already made.
    #[error("Usage limit {limit} is below current usage {used}")]
    UsageLimitBelowUsage { limit: u32, used: u32 },

    /// The same product or category is both allowed and excluded.
    #[error("Coupon rules allow and exclude the same product or category")]
    ConflictingRules,

    #[error("Coupon {code} is not active")]
    Inactive { code: CouponCode },

    #[error("Coupon {code} is not valid before {valid_from}")]
    NotYetValid {
        code: CouponCode,
        valid_from: DateTime<Utc>,
    },

    #[error("Coupon {code} expired at {valid_until}")]
    Expired {
        code: CouponCode,
        valid_until: DateTime<Utc>,
    },

    #[error("Coupon {code} reached its usage limit of {limit}")]
    UsageLimitReached { code: CouponCode, limit: u32 },

    /// None of the ordered products is eligible.
    #[error("Coupon {code} does not apply to any ordered product")]
    NotApplicable { code: CouponCode },
}

/// Events raised by the coupon aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CouponEvent {
    Created {
        coupon_id: CouponId,
        code: CouponCode,
        percentage: Percentage,
    },
    Updated {
        coupon_id: CouponId,
        percentage: Percentage,
    },
    Activated {
        coupon_id: CouponId,
    },
    Deactivated {
        coupon_id: CouponId,
    },
    RulesChanged {
        coupon_id: CouponId,
        rules: CouponRules,
    },
    Redeemed {
        coupon_id: CouponId,
        times_used: u32,
    },
    Released {
        coupon_id: CouponId,
        times_used: u32,
    },
}

impl DomainEvent for CouponEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CouponEvent::Created { .. } => "CouponCreated",
            CouponEvent::Updated { .. } => "CouponUpdated",
            CouponEvent::Activated { .. } => "CouponActivated",
            CouponEvent::Deactivated { .. } => "CouponDeactivated",
            CouponEvent::RulesChanged { .. } => "CouponRulesChanged",
            CouponEvent::Redeemed { .. } => "CouponRedeemed",
            CouponEvent::Released { .. } => "CouponReleased",
        }
    }
}
