//! Storage for the marketplace collections.
//!
//! # Collections
//!
//! - `tools` - Catalog
//! - `users` - Identities and roles (keyed by email)
//! - `orders` - Purchases
//! - `payments` - Append-only payment log
//! - `reviews` - Customer reviews
//! - `profiles` - Purchaser profiles (keyed by email)
//!
//! # Backends
//!
//! Handlers only see the [`Store`] trait. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process and backs local
//! development (`SERVER_STORAGE=memory`) and the router tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tool-market-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tool_market_core::{Email, OrderId, Role, ToolId};

use crate::models::{
    NewOrder, NewReview, NewTool, Order, PaymentRecord, Profile, ProfileUpdate, Review, Tool,
    User, UserUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of an upsert keyed by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub record: T,
    /// `true` if no record existed before the write.
    pub created: bool,
}

/// Result of the duplicate-guarded order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOrder {
    /// No order existed for the (tool, purchaser) pair; this one was inserted.
    Created(Order),
    /// An order for the pair already exists; nothing was written.
    Existing(Order),
}

/// Result of recording a payment against an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order was marked paid and a payment record appended.
    Recorded {
        order: Order,
        payment: PaymentRecord,
    },
    /// The order was already paid; nothing was written.
    AlreadyPaid(Order),
    /// No order with that ID.
    NotFound,
}

/// Storage operations used by the HTTP handlers.
///
/// Lookups return `Option` so callers branch on absence explicitly.
/// `place_order` and `record_payment` are atomic in every backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // --- tools ---

    async fn list_tools(&self) -> Result<Vec<Tool>, RepositoryError>;
    async fn get_tool(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError>;
    async fn find_tool_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError>;
    async fn create_tool(&self, tool: NewTool) -> Result<Tool, RepositoryError>;
    /// Returns `false` if the tool did not exist.
    async fn delete_tool(&self, id: ToolId) -> Result<bool, RepositoryError>;

    // --- users ---

    async fn upsert_user(
        &self,
        email: &Email,
        update: UserUpdate,
    ) -> Result<Upserted<User>, RepositoryError>;
    async fn get_user(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    /// Returns `None` if the identity does not exist.
    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<User>, RepositoryError>;

    // --- orders ---

    /// Insert the order unless one already exists for its (tool, purchaser) pair.
    async fn place_order(&self, order: NewOrder) -> Result<PlaceOrder, RepositoryError>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn list_orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError>;
    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;
    /// Mark the order paid and append a payment record, in one unit.
    async fn record_payment(
        &self,
        id: OrderId,
        transaction_id: &str,
    ) -> Result<PaymentOutcome, RepositoryError>;
    /// Returns `None` if the order does not exist.
    async fn accept_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Returns `false` if the order did not exist. Payment records are kept.
    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError>;
    async fn list_payments_for(&self, order: OrderId) -> Result<Vec<PaymentRecord>, RepositoryError>;

    // --- reviews ---

    async fn list_reviews(&self) -> Result<Vec<Review>, RepositoryError>;
    async fn create_review(&self, author: &Email, review: NewReview)
    -> Result<Review, RepositoryError>;

    // --- profiles ---

    async fn get_profile(&self, email: &Email) -> Result<Option<Profile>, RepositoryError>;
    async fn upsert_profile(
        &self,
        email: &Email,
        update: ProfileUpdate,
    ) -> Result<Upserted<Profile>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
