//! Domain error types.

use thiserror::Error;

use crate::{
    AddressError, CarrierError, CategoryError, CouponError, InvalidEmail, OrderError,
    PaymentError, ProductError, SaleError, ShipmentError, ShippingMethodError, UserError,
};

/// Any rule violation raised by an aggregate or value object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error(transparent)]
    Email(#[from] InvalidEmail),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    ShippingMethod(#[from] ShippingMethodError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Sale(#[from] SaleError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Shipment(#[from] ShipmentError),
}

impl DomainError {
    /// Returns true if the error rejects a status change rather than bad input.
    ///
    /// Callers report these as conflicts with the current state.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::Order(OrderError::InvalidStatusTransition { .. })
                | DomainError::Payment(PaymentError::InvalidStatusTransition { .. })
                | DomainError::Shipment(ShipmentError::InvalidStatusTransition { .. })
                | DomainError::Sale(SaleError::AlreadyEnded { .. })
        )
    }
}
