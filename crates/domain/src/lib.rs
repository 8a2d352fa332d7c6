//! Domain layer for the storefront.
//!
//! This crate provides the aggregates and the rules they enforce:
//! - catalog: [`Product`], [`Category`]
//! - promotions: [`Coupon`], [`Sale`] and the [`DiscountService`]
//! - fulfilment: [`Order`], [`Payment`], [`Shipment`], [`ShippingMethod`], [`Carrier`]
//! - identity: [`User`]
//!
//! Aggregates are plain state. Every command method checks its invariants,
//! mutates the aggregate and records events; persistence drains them with
//! [`shared_kernel::AggregateRoot::take_events`].

pub mod carrier;
pub mod category;
pub mod coupon;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod payment;
pub mod product;
pub mod sale;
pub mod services;
pub mod shipment;
pub mod shipping_method;
pub mod specifications;
pub mod user;
pub mod value_objects;

pub use carrier::{Carrier, CarrierError, CarrierEvent};
pub use category::{Category, CategoryError, CategoryEvent};
pub use coupon::{Coupon, CouponCode, CouponError, CouponEvent, CouponRules, CouponTerms};
pub use error::DomainError;
pub use event::Event;
pub use ids::{
    CarrierId, CategoryId, CouponId, OrderId, PaymentId, ProductId, SaleId, ShipmentId,
    ShippingMethodId, UserId,
};
pub use order::{NewOrder, Order, OrderError, OrderEvent, OrderLine, OrderStatus};
pub use payment::{Payment, PaymentError, PaymentEvent, PaymentMethod, PaymentStatus};
pub use product::{NewProduct, Product, ProductError, ProductEvent, normalize_sku};
pub use sale::{Sale, SaleError, SaleEvent, SaleTerms};
pub use services::{AppliedDiscount, DiscountService, DiscountSource, PriceQuote};
pub use shipment::{NewShipment, Shipment, ShipmentError, ShipmentEvent, ShipmentStatus};
pub use shipping_method::{ShippingMethod, ShippingMethodError, ShippingMethodEvent};
pub use user::{Role, User, UserError, UserEvent};
pub use value_objects::{Address, AddressError, Email, InvalidEmail};
