//! Infrastructure services used by the request handlers.

pub mod clock;
pub mod identity;
pub mod payment_gateway;

pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{
    HmacPasswordHasher, IdentityError, IssuedToken, JwtTokenService, PasswordHasher, TokenService,
    derive_key,
};
pub use payment_gateway::{
    ChargeOutcome, ChargeRequest, GatewayError, MockPaymentGateway, PaymentGateway,
};
