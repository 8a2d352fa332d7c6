//! Every request the storefront handles, grouped by area.

pub mod catalog;
pub mod identity;
pub mod ordering;
pub mod payments;
pub mod promotions;
pub mod shipments;
pub mod shipping;

pub use catalog::{
    AdjustStock, ChangeProductPrice, CreateCategory, CreateProduct, DeleteCategory, GetCategory,
    GetProduct, ListCategories, ListProducts, ProductView, SetProductActive, SetProductCategories,
    UpdateCategory, UpdateProduct,
};
pub use identity::{
    AuthSession, ChangePassword, ChangeUserRole, GetCurrentUser, GetUser, ListUsers, Login,
    RegisterUser, SetShippingAddress, UpdateProfile, seed_admin,
};
pub use ordering::{
    CancelOrder, GetOrder, GetOrderHistory, ListOrders, OrderLineInput, PlaceOrder,
};
pub use payments::{GetPayment, GetPaymentForOrder, ProcessPayment};
pub use promotions::{
    CouponInput, CouponPreview, CreateCoupon, CreateSale, DeleteCoupon, EndSale, GetCoupon,
    GetSale, ListCoupons, ListSales, PreviewCoupon, SaleInput, SetCouponActive, SetCouponRules,
    SetSaleTargets, UpdateCoupon, UpdateSale,
};
pub use shipments::{DeliverShipment, GetShipment, GetShipmentForOrder, ShipShipment};
pub use shipping::{
    CreateCarrier, CreateShippingMethod, GetCarrier, GetShippingMethod, ListCarriers,
    ListShippingMethods, SetCarrierActive, SetShippingMethodActive, UpdateCarrier,
    UpdateShippingMethod,
};
