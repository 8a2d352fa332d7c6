//! Query specifications over the aggregates.
//!
//! Filters carry an ordering where one is natural for the listing they back
//! (orders newest first, catalog entries by name). Combine them with
//! [`shared_kernel::SpecificationExt`]; the left-hand side decides the order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use shared_kernel::Specification;

use crate::{
    Carrier, CarrierId, Category, CategoryId, Coupon, CouponCode, Email, Order, OrderId,
    OrderStatus, Payment, Product, Sale, Shipment, ShippingMethod, User, UserId,
};

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Declares a match-everything specification with a fixed ordering.
macro_rules! listing {
    ($(#[$meta:meta])* $name:ident, $ty:ty, |$a:ident, $b:ident| $cmp:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Specification<$ty> for $name {
            fn is_satisfied_by(&self, _candidate: &$ty) -> bool {
                true
            }

            fn compare(&self, $a: &$ty, $b: &$ty) -> Ordering {
                $cmp
            }
        }
    };
}

listing!(
    /// Every user, oldest account first.
    AllUsers, User, |a, b| a.created_at().cmp(&b.created_at())
);
listing!(
    /// Every category by name.
    AllCategories, Category, |a, b| by_name(a.name(), b.name())
);
listing!(
    /// Every product by name.
    AllProducts, Product, |a, b| by_name(a.name(), b.name())
);
listing!(
    /// Every carrier by name.
    AllCarriers, Carrier, |a, b| by_name(a.name(), b.name())
);
listing!(
    /// Every shipping method, cheapest first.
    AllShippingMethods, ShippingMethod, |a, b| a.price().cmp(&b.price()).then_with(|| by_name(a.name(), b.name()))
);
listing!(
    /// Every coupon by code.
    AllCoupons, Coupon, |a, b| a.code().cmp(b.code())
);
listing!(
    /// Every sale, latest start first.
    AllSales, Sale, |a, b| b.starts_at().cmp(&a.starts_at())
);
listing!(
    /// Every order, newest first.
    AllOrders, Order, |a, b| b.created_at().cmp(&a.created_at())
);

/// Orders placed by one user, newest first.
#[derive(Debug, Clone, Copy)]
pub struct OrdersByOwner(pub UserId);

impl Specification<Order> for OrdersByOwner {
    fn is_satisfied_by(&self, order: &Order) -> bool {
        order.owner_id() == self.0
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        b.created_at().cmp(&a.created_at())
    }
}

/// Orders in one status.
#[derive(Debug, Clone, Copy)]
pub struct OrdersByStatus(pub OrderStatus);

impl Specification<Order> for OrdersByStatus {
    fn is_satisfied_by(&self, order: &Order) -> bool {
        order.status() == self.0
    }
}

/// Products assigned to a category.
#[derive(Debug, Clone, Copy)]
pub struct ProductsInCategory(pub CategoryId);

impl Specification<Product> for ProductsInCategory {
    fn is_satisfied_by(&self, product: &Product) -> bool {
        product.in_category(self.0)
    }
}

/// Products whose name or SKU contains a term, ignoring case.
#[derive(Debug, Clone)]
pub struct ProductsMatchingName {
    term: String,
}

impl ProductsMatchingName {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.trim().to_lowercase(),
        }
    }
}

impl Specification<Product> for ProductsMatchingName {
    fn is_satisfied_by(&self, product: &Product) -> bool {
        product.name().to_lowercase().contains(&self.term)
            || product.sku().to_lowercase().contains(&self.term)
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        by_name(a.name(), b.name())
    }
}

/// Products that can be ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveProducts;

impl Specification<Product> for ActiveProducts {
    fn is_satisfied_by(&self, product: &Product) -> bool {
        product.is_active()
    }
}

/// The product with a given (normalized) SKU.
#[derive(Debug, Clone)]
pub struct ProductBySku(pub String);

impl Specification<Product> for ProductBySku {
    fn is_satisfied_by(&self, product: &Product) -> bool {
        product.sku() == self.0
    }
}

/// Sales running at a point in time.
#[derive(Debug, Clone, Copy)]
pub struct ActiveSales {
    pub now: DateTime<Utc>,
}

impl ActiveSales {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Specification<Sale> for ActiveSales {
    fn is_satisfied_by(&self, sale: &Sale) -> bool {
        sale.is_active(self.now)
    }

    fn compare(&self, a: &Sale, b: &Sale) -> Ordering {
        a.starts_at().cmp(&b.starts_at())
    }
}

#[derive(Debug, Clone)]
pub struct CouponByCode(pub CouponCode);

impl Specification<Coupon> for CouponByCode {
    fn is_satisfied_by(&self, coupon: &Coupon) -> bool {
        coupon.code() == &self.0
    }
}

#[derive(Debug, Clone)]
pub struct UserByEmail(pub Email);

impl Specification<User> for UserByEmail {
    fn is_satisfied_by(&self, user: &User) -> bool {
        user.email() == &self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentForOrder(pub OrderId);

impl Specification<Payment> for PaymentForOrder {
    fn is_satisfied_by(&self, payment: &Payment) -> bool {
        payment.order_id() == self.0
    }

    // Latest payment first.
    fn compare(&self, a: &Payment, b: &Payment) -> Ordering {
        b.created_at().cmp(&a.created_at())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShipmentForOrder(pub OrderId);

impl Specification<Shipment> for ShipmentForOrder {
    fn is_satisfied_by(&self, shipment: &Shipment) -> bool {
        shipment.order_id() == self.0
    }

    fn compare(&self, a: &Shipment, b: &Shipment) -> Ordering {
        b.created_at().cmp(&a.created_at())
    }
}

/// Shipping methods offered by one carrier.
#[derive(Debug, Clone, Copy)]
pub struct ShippingMethodsByCarrier(pub CarrierId);

impl Specification<ShippingMethod> for ShippingMethodsByCarrier {
    fn is_satisfied_by(&self, method: &ShippingMethod) -> bool {
        method.carrier_id() == self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveShippingMethods;

impl Specification<ShippingMethod> for ActiveShippingMethods {
    fn is_satisfied_by(&self, method: &ShippingMethod) -> bool {
        method.is_active()
    }
}
