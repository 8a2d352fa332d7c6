//! Coupon code and eligibility rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::CouponError;
use crate::{CategoryId, ProductId};

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 32;

/// A redeemable coupon code, stored uppercase.
///
/// Codes are 3 to 32 characters of ASCII letters, digits, `-` or `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn parse(raw: &str) -> Result<Self, CouponError> {
        let code = raw.trim().to_uppercase();
        let valid_len = (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len());
        let valid_chars = code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid_len || !valid_chars {
            return Err(CouponError::InvalidCode {
                code: raw.trim().to_string(),
            });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

/// Which products a coupon may discount.
///
/// Exclusions always win. With no allowed products and no allowed
/// categories the coupon applies to everything that is not excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRules {
    #[serde(default)]
    pub allowed_products: BTreeSet<ProductId>,
    #[serde(default)]
    pub allowed_categories: BTreeSet<CategoryId>,
    #[serde(default)]
    pub excluded_products: BTreeSet<ProductId>,
    #[serde(default)]
    pub excluded_categories: BTreeSet<CategoryId>,
}

impl CouponRules {
    /// Returns true if a product in `categories` is eligible.
    pub fn applies_to(&self, product_id: ProductId, categories: &BTreeSet<CategoryId>) -> bool {
        if self.excluded_products.contains(&product_id)
            || !self.excluded_categories.is_disjoint(categories)
        {
            return false;
        }
        if self.is_unrestricted() {
            return true;
        }
        self.allowed_products.contains(&product_id)
            || !self.allowed_categories.is_disjoint(categories)
    }

    /// True when no allow-list is set.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_products.is_empty() && self.allowed_categories.is_empty()
    }

    /// Rejects rules that allow and exclude the same id.
    pub fn validate(&self) -> Result<(), CouponError> {
        if !self.allowed_products.is_disjoint(&self.excluded_products)
            || !self.allowed_categories.is_disjoint(&self.excluded_categories)
        {
            return Err(CouponError::ConflictingRules);
        }
        Ok(())
    }
}
