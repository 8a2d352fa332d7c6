//! Application layer for the storefront.
//!
//! Every use case is a [`Request`] sent through the [`Mediator`]. The
//! mediator authorizes the [`Actor`] against the request's [`Policy`],
//! validates the input, runs the handler inside a [`Session`] and then
//! hands the domain events raised on the way to the [`EventDispatcher`].
//!
//! ```ignore
//! let mediator = Mediator::new(context);
//! let order = mediator.send(actor, PlaceOrder { .. }).await?;
//! ```

pub mod authorization;
pub mod context;
pub mod error;
pub mod events;
pub mod mediator;
pub mod requests;
pub mod services;
pub mod session;
pub mod validation;

pub use authorization::{Actor, Policy};
pub use context::AppContext;
pub use error::{AppError, Result};
pub use events::{EventDispatcher, EventHandler};
pub use mediator::{Mediator, Request};
pub use session::Session;
pub use validation::{AddressInput, MAX_PRICE_CENTS, ValidationErrors};
