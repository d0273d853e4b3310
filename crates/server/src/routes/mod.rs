//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                            - Greeting
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (store reachable)
//!
//! # Tools
//! GET    /tools                       - Catalog
//! GET    /tools/{id}                  - One tool
//! POST   /tools                       - Add a tool (admin)
//! DELETE /tools/{id}                  - Remove a tool (admin)
//!
//! # Users
//! PUT    /user/{email}                - Upsert identity, issue token
//! GET    /user                        - All identities (admin)
//! PUT    /user/admin/{email}          - Promote to admin (admin)
//! GET    /admin/{email}               - Is this identity an admin?
//!
//! # Orders (token)
//! POST   /orders                      - Place an order
//! GET    /orders?email=               - Caller's orders
//! GET    /orders/{id}                 - One order (purchaser or admin)
//! PATCH  /orders/{id}                 - Confirm payment (purchaser)
//! DELETE /orders/{id}                 - Cancel (purchaser or admin)
//!
//! # Order administration (admin)
//! GET    /admin/orders                - All orders
//! PATCH  /admin/orders/{id}           - Accept an order
//! GET    /admin/orders/{id}/payments  - Payment log of an order
//!
//! # Reviews
//! GET    /reviews                     - All reviews, newest first
//! POST   /reviews                     - Post a review (token)
//!
//! # Profiles (token, own profile only)
//! GET    /profile/{email}             - Read profile
//! PUT    /profile_update/{email}      - Upsert profile
//!
//! # Payments (token)
//! POST   /create-payment-intent       - Card payment intent for a price
//! ```

pub mod admin;
pub mod health;
pub mod orders;
pub mod payments;
pub mod profiles;
pub mod reviews;
pub mod tools;
pub mod users;

use std::str::FromStr;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tool_market_core::Email;

use crate::error::AppError;
use crate::state::AppState;

/// All API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/tools", get(tools::index).post(tools::create))
        .route("/tools/{id}", get(tools::show).delete(tools::delete))
        .route("/user", get(users::index))
        .route("/user/{email}", put(users::upsert))
        .route("/user/admin/{email}", put(users::promote))
        .route("/admin/{email}", get(users::is_admin))
        .route("/orders", get(orders::index).post(orders::place))
        .route(
            "/orders/{id}",
            get(orders::show)
                .patch(orders::confirm_payment)
                .delete(orders::cancel),
        )
        .route("/admin/orders", get(admin::orders))
        .route("/admin/orders/{id}", patch(admin::accept_order))
        .route("/admin/orders/{id}/payments", get(admin::order_payments))
        .route("/reviews", get(reviews::index).post(reviews::create))
        .route("/profile/{email}", get(profiles::show))
        .route("/profile_update/{email}", put(profiles::upsert))
        .route("/create-payment-intent", post(payments::create_intent))
}

/// Parse an email path segment, rejecting malformed ones with 400.
pub(crate) fn parse_email(raw: &str) -> Result<Email, AppError> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))
}

/// Parse an ID path segment, rejecting malformed ones with 400.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {raw}")))
}
