//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (no `DATABASE_URL` needed to build).
//! The two multi-write operations run inside a transaction:
//!
//! - `place_order` takes a transaction-scoped advisory lock on the
//!   (tool, purchaser) pair before the existence check, so concurrent
//!   identical purchases serialize and only one inserts.
//! - `record_payment` locks the order row, flips `paid`, and appends the
//!   payment record before committing.

use async_trait::async_trait;
use sqlx::PgPool;
use tool_market_core::{Email, OrderId, Role, ToolId};

use super::{PaymentOutcome, PlaceOrder, RepositoryError, Store, Upserted};
use crate::models::{
    NewOrder, NewReview, NewTool, Order, PaymentRecord, Profile, ProfileUpdate, Review, Tool,
    User, UserUpdate,
};

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for queries outside the [`Store`] surface.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow<T> {
    #[sqlx(flatten)]
    record: T,
    created: bool,
}

impl<T> From<UpsertRow<T>> for Upserted<T> {
    fn from(row: UpsertRow<T>) -> Self {
        Self {
            record: row.record,
            created: row.created,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, RepositoryError> {
        let tools = sqlx::query_as::<_, Tool>(
            r"
            SELECT id, name, description, image, price,
                   min_order_quantity, available_quantity, created_at
            FROM tools
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tools)
    }

    async fn get_tool(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError> {
        let tool = sqlx::query_as::<_, Tool>(
            r"
            SELECT id, name, description, image, price,
                   min_order_quantity, available_quantity, created_at
            FROM tools
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tool)
    }

    async fn find_tool_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError> {
        let tool = sqlx::query_as::<_, Tool>(
            r"
            SELECT id, name, description, image, price,
                   min_order_quantity, available_quantity, created_at
            FROM tools
            WHERE name = $1
            LIMIT 1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tool)
    }

    async fn create_tool(&self, tool: NewTool) -> Result<Tool, RepositoryError> {
        let tool = sqlx::query_as::<_, Tool>(
            r"
            INSERT INTO tools (name, description, image, price,
                               min_order_quantity, available_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, image, price,
                      min_order_quantity, available_quantity, created_at
            ",
        )
        .bind(tool.name)
        .bind(tool.description)
        .bind(tool.image)
        .bind(tool.price)
        .bind(tool.min_order_quantity)
        .bind(tool.available_quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(tool)
    }

    async fn delete_tool(&self, id: ToolId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_user(
        &self,
        email: &Email,
        update: UserUpdate,
    ) -> Result<Upserted<User>, RepositoryError> {
        // `xmax = 0` holds only for a freshly inserted row.
        let row = sqlx::query_as::<_, UpsertRow<User>>(
            r"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(EXCLUDED.name, users.name),
                    updated_at = now()
            RETURNING email, name, role, created_at, updated_at,
                      (xmax = 0) AS created
            ",
        )
        .bind(email)
        .bind(update.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_user(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT email, name, role, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r"
            SELECT email, name, role, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET role = $2, updated_at = now()
            WHERE email = $1
            RETURNING email, name, role, created_at, updated_at
            ",
        )
        .bind(email)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn place_order(&self, order: NewOrder) -> Result<PlaceOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(&order.tool_name)
            .bind(&order.email)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, Order>(
            r"
            SELECT id, tool_name, email, customer_name, quantity, price, address, phone,
                   paid, transaction_id, admin_accept, created_at
            FROM orders
            WHERE tool_name = $1 AND email = $2
            ORDER BY created_at ASC
            LIMIT 1
            ",
        )
        .bind(&order.tool_name)
        .bind(&order.email)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            tx.commit().await?;
            return Ok(PlaceOrder::Existing(existing));
        }

        let created = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (tool_name, email, customer_name, quantity, price, address, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tool_name, email, customer_name, quantity, price, address, phone,
                      paid, transaction_id, admin_accept, created_at
            ",
        )
        .bind(&order.tool_name)
        .bind(&order.email)
        .bind(&order.customer_name)
        .bind(order.quantity)
        .bind(order.price)
        .bind(&order.address)
        .bind(&order.phone)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PlaceOrder::Created(created))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, tool_name, email, customer_name, quantity, price, address, phone,
                   paid, transaction_id, admin_accept, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn list_orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, tool_name, email, customer_name, quantity, price, address, phone,
                   paid, transaction_id, admin_accept, created_at
            FROM orders
            WHERE email = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, tool_name, email, customer_name, quantity, price, address, phone,
                   paid, transaction_id, admin_accept, created_at
            FROM orders
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn record_payment(
        &self,
        id: OrderId,
        transaction_id: &str,
    ) -> Result<PaymentOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Order>(
            r"
            SELECT id, tool_name, email, customer_name, quantity, price, address, phone,
                   paid, transaction_id, admin_accept, created_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(PaymentOutcome::NotFound);
        };
        if current.paid {
            return Ok(PaymentOutcome::AlreadyPaid(current));
        }

        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET paid = TRUE, transaction_id = $2
            WHERE id = $1
            RETURNING id, tool_name, email, customer_name, quantity, price, address, phone,
                      paid, transaction_id, admin_accept, created_at
            ",
        )
        .bind(id)
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        let payment = sqlx::query_as::<_, PaymentRecord>(
            r"
            INSERT INTO payments (order_id, transaction_id, email, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, transaction_id, email, amount, created_at
            ",
        )
        .bind(order.id)
        .bind(transaction_id)
        .bind(&order.email)
        .bind(order.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PaymentOutcome::Recorded { order, payment })
    }

    async fn accept_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET admin_accept = TRUE
            WHERE id = $1
            RETURNING id, tool_name, email, customer_name, quantity, price, address, phone,
                      paid, transaction_id, admin_accept, created_at
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_payments_for(
        &self,
        order: OrderId,
    ) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            r"
            SELECT id, order_id, transaction_id, email, amount, created_at
            FROM payments
            WHERE order_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(order)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT id, email, name, rating, comment, created_at
            FROM reviews
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn create_review(
        &self,
        author: &Email,
        review: NewReview,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            r"
            INSERT INTO reviews (email, name, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, rating, comment, created_at
            ",
        )
        .bind(author)
        .bind(review.name)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    async fn get_profile(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(
            r"
            SELECT email, name, education, location, phone, linkedin, updated_at
            FROM profiles
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_profile(
        &self,
        email: &Email,
        update: ProfileUpdate,
    ) -> Result<Upserted<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, UpsertRow<Profile>>(
            r"
            INSERT INTO profiles (email, name, education, location, phone, linkedin)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(EXCLUDED.name, profiles.name),
                    education = COALESCE(EXCLUDED.education, profiles.education),
                    location = COALESCE(EXCLUDED.location, profiles.location),
                    phone = COALESCE(EXCLUDED.phone, profiles.phone),
                    linkedin = COALESCE(EXCLUDED.linkedin, profiles.linkedin),
                    updated_at = now()
            RETURNING email, name, education, location, phone, linkedin, updated_at,
                      (xmax = 0) AS created
            ",
        )
        .bind(email)
        .bind(update.name)
        .bind(update.education)
        .bind(update.location)
        .bind(update.phone)
        .bind(update.linkedin)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
