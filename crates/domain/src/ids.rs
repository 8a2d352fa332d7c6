//! Typed identifiers for every aggregate.

use shared_kernel::define_id;

define_id!(
    /// Identifier of a registered user.
    UserId
);

define_id!(
    /// Identifier of a catalog product.
    ProductId
);

define_id!(
    /// Identifier of a product category.
    CategoryId
);

define_id!(
    /// Identifier of an order.
    OrderId
);

define_id!(
    /// Identifier of a payment.
    PaymentId
);

define_id!(
    /// Identifier of a coupon.
    CouponId
);

define_id!(
    /// Identifier of a sale campaign.
    SaleId
);

define_id!(
    /// Identifier of a shipment.
    ShipmentId
);

define_id!(
    /// Identifier of a shipping method.
    ShippingMethodId
);

define_id!(
    /// Identifier of a carrier.
    CarrierId
);
