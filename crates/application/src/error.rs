//! Application error types.

use domain::{
    AddressError, CarrierError, CategoryError, CouponError, DomainError, InvalidEmail, OrderError,
    PaymentError, ProductError, SaleError, ShipmentError, ShippingMethodError, UserError,
};
use persistence::StoreError;
use thiserror::Error;

use crate::services::{GatewayError, IdentityError};
use crate::validation::ValidationErrors;

/// Errors returned by the mediator.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The caller is not authenticated, or their credentials are wrong.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but may not perform the request.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A referenced resource does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The request conflicts with existing state (duplicates, stale versions, references).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A domain rule rejected the request.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The payment gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Storage failed.
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Any other failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("You do not have access to this resource".to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => AppError::NotFound {
                kind,
                id: id.to_string(),
            },
            conflict @ (StoreError::ConcurrencyConflict { .. } | StoreError::DuplicateKey { .. }) => {
                AppError::Conflict(conflict.to_string())
            }
            other => AppError::Store(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken(reason) => AppError::Unauthorized(reason),
            other => AppError::Internal(other.to_string()),
        }
    }
}

macro_rules! impl_from_domain {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    AppError::Domain(DomainError::from(err))
                }
            }
        )*
    };
}

impl_from_domain!(
    InvalidEmail,
    AddressError,
    UserError,
    CategoryError,
    ProductError,
    CarrierError,
    ShippingMethodError,
    CouponError,
    SaleError,
    OrderError,
    PaymentError,
    ShipmentError,
);

/// Convenience type alias for application results.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared_kernel::Version;
    use uuid::Uuid;

    #[test]
    fn store_errors_map_to_request_errors() {
        let id = Uuid::new_v4();
        let missing: AppError = StoreError::NotFound {
            kind: "Order".into(),
            id,
        }
        .into();
        assert!(matches!(missing, AppError::NotFound { ref kind, .. } if kind == "Order"));

        let stale: AppError = StoreError::ConcurrencyConflict {
            kind: "Order".into(),
            id,
            expected: Version::first(),
            actual: Version::new(2),
        }
        .into();
        assert!(matches!(stale, AppError::Conflict(_)));

        let taken: AppError = StoreError::DuplicateKey {
            scope: "Email".into(),
            key: "dup@shop.test".into(),
        }
        .into();
        assert!(matches!(taken, AppError::Conflict(ref msg) if msg.contains("dup@shop.test")));
    }

    #[test]
    fn aggregate_errors_lift_into_domain_errors() {
        let err: AppError = ProductError::NameRequired.into();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::Product(ProductError::NameRequired))
        ));
    }
}
