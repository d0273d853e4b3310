//! Business logic services.

pub mod auth;
pub mod orders;
pub mod payments;

pub use auth::{AuthError, TokenService};
pub use orders::{OrderError, OrderService};
pub use payments::{DisabledProcessor, PaymentError, PaymentProcessor, StripeClient};
