//! Value objects shared by several aggregates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted email address.
const MAX_EMAIL_LEN: usize = 254;

/// Error returned for a malformed email address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid email address: {0}")]
pub struct InvalidEmail(pub String);

/// A normalized (trimmed, lowercase) email address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parses and normalizes an email address.
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let normalized = raw.trim().to_lowercase();
        let invalid = || InvalidEmail(raw.trim().to_string());

        if normalized.is_empty()
            || normalized.len() > MAX_EMAIL_LEN
            || normalized.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }

        let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(invalid());
        }

        Ok(Self(normalized))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = InvalidEmail;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Error returned when an address field is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Address {field} is required")]
pub struct AddressError {
    pub field: &'static str,
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Builds an address, trimming every field and rejecting blank ones.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, AddressError> {
        fn required(value: String, field: &'static str) -> Result<String, AddressError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(AddressError { field })
            } else {
                Ok(trimmed.to_string())
            }
        }

        Ok(Self {
            street: required(street.into(), "street")?,
            city: required(city.into(), "city")?,
            state: required(state.into(), "state")?,
            postal_code: required(postal_code.into(), "postal_code")?,
            country: required(country.into(), "country")?,
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.postal_code, self.country
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::parse("  Jane.Doe@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in [
            "",
            "plain",
            "@example.com",
            "jane@",
            "jane@example",
            "jane@.com",
            "jane@example.",
            "ja ne@example.com",
            "a@b@example.com",
        ] {
            assert!(Email::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn email_deserialization_validates() {
        let ok: Email = serde_json::from_str("\"USER@shop.io\"").unwrap();
        assert_eq!(ok.as_str(), "user@shop.io");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    #[test]
    fn address_requires_every_field() {
        let address = Address::new(" 1 Main St ", "Springfield", "IL", "62701", "US").unwrap();
        assert_eq!(address.street, "1 Main St");
        assert_eq!(address.to_string(), "1 Main St, Springfield, IL 62701, US");

        let err = Address::new("1 Main St", "Springfield", "IL", "  ", "US").unwrap_err();
        assert_eq!(err.field, "postal_code");
    }
}
