//! Coupon aggregate implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Percentage, Version};

use super::{CouponCode, CouponError, CouponEvent, CouponRules};
use crate::{CategoryId, CouponId, ProductId};

/// The editable terms of a coupon.
#[derive(Debug, Clone)]
pub struct CouponTerms {
    pub description: String,
    pub percentage: Percentage,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,
}

impl CouponTerms {
    fn validate(&self, times_used: u32) -> Result<(), CouponError> {
        if self.valid_from >= self.valid_until {
            return Err(CouponError::InvalidWindow);
        }
        match self.usage_limit {
            Some(0) => Err(CouponError::InvalidUsageLimit),
            Some(limit) if limit < times_used => Err(CouponError::UsageLimitBelowUsage {
                limit,
                used: times_used,
            }),
            _ => Ok(()),
        }
    }
}

/// A percentage discount redeemable by code.
///
/// A coupon is valid while it is active, `now` lies in
/// `[valid_from, valid_until)` and the usage limit (if any) has not been
/// reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    id: CouponId,
    code: CouponCode,
    description: String,
    percentage: Percentage,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    usage_limit: Option<u32>,
    times_used: u32,
    active: bool,
    #[serde(default)]
    rules: CouponRules,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<CouponEvent>,
}

// Query methods
impl Coupon {
    pub fn code(&self) -> &CouponCode {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    pub fn usage_limit(&self) -> Option<u32> {
        self.usage_limit
    }

    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rules(&self) -> &CouponRules {
        &self.rules
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks that the coupon can be redeemed at `now`.
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.active {
            return Err(CouponError::Inactive {
                code: self.code.clone(),
            });
        }
        if now < self.valid_from {
            return Err(CouponError::NotYetValid {
                code: self.code.clone(),
                valid_from: self.valid_from,
            });
        }
        if now >= self.valid_until {
            return Err(CouponError::Expired {
                code: self.code.clone(),
                valid_until: self.valid_until,
            });
        }
        if let Some(limit) = self.usage_limit
            && self.times_used >= limit
        {
            return Err(CouponError::UsageLimitReached {
                code: self.code.clone(),
                limit,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.ensure_valid(now).is_ok()
    }

    /// Returns true if the coupon's rules make the product eligible.
    pub fn applies_to(&self, product_id: ProductId, categories: &BTreeSet<CategoryId>) -> bool {
        self.rules.applies_to(product_id, categories)
    }
}

// Command methods
impl Coupon {
    pub fn create(
        code: CouponCode,
        terms: CouponTerms,
        now: DateTime<Utc>,
    ) -> Result<Self, CouponError> {
        terms.validate(0)?;

        let id = CouponId::new();
        Ok(Self {
            id,
            code: code.clone(),
            description: terms.description.trim().to_string(),
            percentage: terms.percentage,
            valid_from: terms.valid_from,
            valid_until: terms.valid_until,
            usage_limit: terms.usage_limit,
            times_used: 0,
            active: true,
            rules: CouponRules::default(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![CouponEvent::Created {
                coupon_id: id,
                code,
                percentage: terms.percentage,
            }],
        })
    }

    pub fn update(&mut self, terms: CouponTerms, now: DateTime<Utc>) -> Result<(), CouponError> {
        terms.validate(self.times_used)?;

        self.description = terms.description.trim().to_string();
        self.percentage = terms.percentage;
        self.valid_from = terms.valid_from;
        self.valid_until = terms.valid_until;
        self.usage_limit = terms.usage_limit;
        self.updated_at = now;
        self.events.push(CouponEvent::Updated {
            coupon_id: self.id,
            percentage: self.percentage,
        });
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if !self.active {
            self.active = true;
            self.updated_at = now;
            self.events
                .push(CouponEvent::Activated { coupon_id: self.id });
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.active {
            self.active = false;
            self.updated_at = now;
            self.events
                .push(CouponEvent::Deactivated { coupon_id: self.id });
        }
    }

    pub fn set_rules(&mut self, rules: CouponRules, now: DateTime<Utc>) -> Result<(), CouponError> {
        rules.validate()?;
        self.rules = rules.clone();
        self.updated_at = now;
        self.events.push(CouponEvent::RulesChanged {
            coupon_id: self.id,
            rules,
        });
        Ok(())
    }

    /// Records one use of the coupon.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<(), CouponError> {
        self.ensure_valid(now)?;
        self.times_used += 1;
        self.updated_at = now;
        self.events.push(CouponEvent::Redeemed {
            coupon_id: self.id,
            times_used: self.times_used,
        });
        Ok(())
    }

    /// Gives back one use, e.g. when the order that redeemed it is canceled.
    pub fn release(&mut self, now: DateTime<Utc>) {
        if self.times_used == 0 {
            return;
        }
        self.times_used -= 1;
        self.updated_at = now;
        self.events.push(CouponEvent::Released {
            coupon_id: self.id,
            times_used: self.times_used,
        });
    }
}

impl AggregateRoot for Coupon {
    type Id = CouponId;
    type Event = CouponEvent;

    fn aggregate_type() -> &'static str {
        "Coupon"
    }

    fn id(&self) -> CouponId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<CouponEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn terms(limit: Option<u32>) -> CouponTerms {
        CouponTerms {
            description: "Summer".into(),
            percentage: Percentage::from_percent(10).unwrap(),
            valid_from: t0(),
            valid_until: t0() + Duration::days(30),
            usage_limit: limit,
        }
    }

    fn summer(limit: Option<u32>) -> Coupon {
        Coupon::create(CouponCode::parse("summer10").unwrap(), terms(limit), t0()).unwrap()
    }

    #[test]
    fn validity_window_is_half_open() {
        let coupon = summer(None);
        assert!(matches!(
            coupon.ensure_valid(t0() - Duration::seconds(1)),
            Err(CouponError::NotYetValid { .. })
        ));
        assert!(coupon.is_valid(t0()));
        assert!(coupon.is_valid(t0() + Duration::days(30) - Duration::seconds(1)));
        assert!(matches!(
            coupon.ensure_valid(t0() + Duration::days(30)),
            Err(CouponError::Expired { .. })
        ));
    }

    #[test]
    fn inactive_coupon_is_invalid() {
        let mut coupon = summer(None);
        coupon.deactivate(t0());
        assert!(matches!(
            coupon.ensure_valid(t0()),
            Err(CouponError::Inactive { .. })
        ));
        coupon.activate(t0());
        assert!(coupon.is_valid(t0()));
    }

    #[test]
    fn redeem_respects_usage_limit() {
        let mut coupon = summer(Some(2));
        coupon.redeem(t0()).unwrap();
        coupon.redeem(t0()).unwrap();
        assert_eq!(coupon.times_used(), 2);

        let err = coupon.redeem(t0()).unwrap_err();
        assert!(matches!(err, CouponError::UsageLimitReached { limit: 2, .. }));

        coupon.release(t0());
        assert_eq!(coupon.times_used(), 1);
        coupon.redeem(t0()).unwrap();
    }

    #[test]
    fn release_never_goes_below_zero() {
        let mut coupon = summer(None);
        coupon.take_events();
        coupon.release(t0());
        assert_eq!(coupon.times_used(), 0);
        assert!(coupon.take_events().is_empty());
    }

    #[test]
    fn terms_are_validated() {
        let mut bad = terms(None);
        bad.valid_until = bad.valid_from;
        assert_eq!(
            Coupon::create(CouponCode::parse("BAD").unwrap(), bad, t0()).unwrap_err(),
            CouponError::InvalidWindow
        );

        assert_eq!(
            Coupon::create(CouponCode::parse("BAD").unwrap(), terms(Some(0)), t0()).unwrap_err(),
            CouponError::InvalidUsageLimit
        );

        let mut coupon = summer(Some(5));
        coupon.redeem(t0()).unwrap();
        coupon.redeem(t0()).unwrap();
        assert_eq!(
            coupon.update(terms(Some(1)), t0()).unwrap_err(),
            CouponError::UsageLimitBelowUsage { limit: 1, used: 2 }
        );
    }

    #[test]
    fn rules_drive_applicability() {
        let mut coupon = summer(None);
        let product = ProductId::new();
        assert!(coupon.applies_to(product, &BTreeSet::new()));

        coupon
            .set_rules(
                CouponRules {
                    excluded_products: BTreeSet::from([product]),
                    ..Default::default()
                },
                t0(),
            )
            .unwrap();
        assert!(!coupon.applies_to(product, &BTreeSet::new()));
    }
}
