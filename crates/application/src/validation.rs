//! Request validation.
//!
//! Validators collect every problem instead of stopping at the first one, so
//! a client can fix a whole form in one round trip.

use std::collections::BTreeMap;
use std::fmt;

use domain::{Address, CouponCode, Email};
use serde::Serialize;
use shared_kernel::Percentage;

/// Field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a failure for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages by field name.
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn require(&mut self, field: &str, value: &str) {
        self.check(!value.trim().is_empty(), field, "is required");
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        self.check(
            value.trim().chars().count() <= max,
            field,
            format!("must be at most {max} characters"),
        );
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if let Err(err) = Email::parse(value) {
            self.add(field, err.to_string());
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        self.check(
            value.chars().count() >= MIN_PASSWORD_LEN,
            field,
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }

    pub fn positive_cents(&mut self, field: &str, cents: i64) {
        self.check(cents > 0, field, "must be greater than 0");
        self.at_most_max_price(field, cents);
    }

    pub fn non_negative_cents(&mut self, field: &str, cents: i64) {
        self.check(cents >= 0, field, "cannot be negative");
        self.at_most_max_price(field, cents);
    }

    fn at_most_max_price(&mut self, field: &str, cents: i64) {
        self.check(
            cents <= MAX_PRICE_CENTS,
            field,
            format!("must be at most {MAX_PRICE_CENTS}"),
        );
    }

    pub fn percentage(&mut self, field: &str, basis_points: u32) {
        if let Err(err) = Percentage::from_basis_points(basis_points) {
            self.add(field, err.to_string());
        }
    }

    pub fn coupon_code(&mut self, field: &str, value: &str) {
        if let Err(err) = CouponCode::parse(value) {
            self.add(field, err.to_string());
        }
    }

    pub fn address(&mut self, field: &str, address: &AddressInput) {
        if let Err(err) = address.to_address() {
            self.add(field, err.to_string());
        }
    }

    /// Turns the collected failures into a result.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Largest accepted unit or shipping price, in cents ($10,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// An unvalidated postal address as it arrives in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressInput {
    pub fn to_address(&self) -> Result<Address, domain::AddressError> {
        Address::new(
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        )
    }
}
