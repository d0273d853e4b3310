//! Order lifecycle.
//!
//! ```text
//!            place                 confirm payment
//!   (none) --------> Created -----------------------> Paid
//!                       |                              |
//!                       | admin accept                 | admin accept
//!                       v                              v
//!                   Accepted ------------------> PaidAndAccepted
//!                            confirm payment
//!
//!   any stage --cancel--> deleted (payment records are kept)
//! ```
//!
//! Payment and acceptance are independent flags, so neither ordering is
//! enforced. Only the purchaser may pay for an order; the purchaser or an
//! admin may read or cancel it.

use thiserror::Error;
use tool_market_core::{Email, OrderId};

use crate::db::{PaymentOutcome, PlaceOrder, RepositoryError, Store};
use crate::models::{NewOrder, Order, PaymentRecord};

/// Errors from order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with that ID.
    #[error("order not found")]
    NotFound,

    /// The caller may not act on this order or purchaser.
    #[error("not permitted for this order")]
    Forbidden,

    /// The order is already paid under another transaction.
    #[error("order already paid with a different transaction")]
    AlreadyPaid,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Order lifecycle operations on behalf of a verified caller.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order for `caller`, unless one exists for the same tool.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` if the order names another purchaser.
    pub async fn place(&self, caller: &Email, order: NewOrder) -> Result<PlaceOrder, OrderError> {
        if &order.email != caller {
            return Err(OrderError::Forbidden);
        }

        let placed = self.store.place_order(order).await?;
        match &placed {
            PlaceOrder::Created(order) => {
                tracing::info!(order_id = %order.id, tool = %order.tool_name, "Order placed");
            }
            PlaceOrder::Existing(order) => {
                tracing::info!(order_id = %order.id, tool = %order.tool_name, "Duplicate order ignored");
            }
        }
        Ok(placed)
    }

    /// Orders placed by `purchaser`; only the purchaser may list them.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` if `caller` is not `purchaser`.
    pub async fn list_for(
        &self,
        caller: &Email,
        purchaser: &Email,
    ) -> Result<Vec<Order>, OrderError> {
        if caller != purchaser {
            return Err(OrderError::Forbidden);
        }
        Ok(self.store.list_orders_for(purchaser).await?)
    }

    /// Fetch one order for its purchaser or an admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Forbidden`.
    pub async fn get(&self, caller: &Email, id: OrderId) -> Result<Order, OrderError> {
        let order = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
        self.ensure_owner_or_admin(caller, &order).await?;
        Ok(order)
    }

    /// Mark an order paid under `transaction_id` and log the payment.
    ///
    /// Repeating the call with the same transaction id returns the order
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound`, `OrderError::Forbidden` when the caller
    /// is not the purchaser, or `OrderError::AlreadyPaid` when the order was
    /// paid under a different transaction.
    pub async fn confirm_payment(
        &self,
        caller: &Email,
        id: OrderId,
        transaction_id: &str,
    ) -> Result<Order, OrderError> {
        let order = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
        if !order.is_purchased_by(caller) {
            return Err(OrderError::Forbidden);
        }

        match self.store.record_payment(id, transaction_id).await? {
            PaymentOutcome::Recorded { order, payment } => {
                tracing::info!(
                    order_id = %order.id,
                    payment_id = %payment.id,
                    amount = %payment.amount,
                    "Payment recorded"
                );
                Ok(order)
            }
            PaymentOutcome::AlreadyPaid(order)
                if order.transaction_id.as_deref() == Some(transaction_id) =>
            {
                Ok(order)
            }
            PaymentOutcome::AlreadyPaid(order) => {
                tracing::warn!(order_id = %order.id, "Payment for an already paid order");
                Err(OrderError::AlreadyPaid)
            }
            PaymentOutcome::NotFound => Err(OrderError::NotFound),
        }
    }

    /// Admin acceptance. Does not require the order to be paid.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    pub async fn accept(&self, id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .store
            .accept_order(id)
            .await?
            .ok_or(OrderError::NotFound)?;
        tracing::info!(order_id = %order.id, stage = %order.stage(), "Order accepted");
        Ok(order)
    }

    /// Delete an order from any stage. Its payment records stay.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Forbidden`.
    pub async fn cancel(&self, caller: &Email, id: OrderId) -> Result<(), OrderError> {
        let order = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
        self.ensure_owner_or_admin(caller, &order).await?;

        if !self.store.delete_order(id).await? {
            return Err(OrderError::NotFound);
        }
        tracing::info!(order_id = %id, stage = %order.stage(), "Order cancelled");
        Ok(())
    }

    /// Payment log of an order, including entries whose order was deleted.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on storage failure.
    pub async fn payments(&self, id: OrderId) -> Result<Vec<PaymentRecord>, OrderError> {
        Ok(self.store.list_payments_for(id).await?)
    }

    async fn ensure_owner_or_admin(&self, caller: &Email, order: &Order) -> Result<(), OrderError> {
        if order.is_purchased_by(caller) {
            return Ok(());
        }
        match self.store.get_user(caller).await? {
            Some(user) if user.is_admin() => Ok(()),
            _ => Err(OrderError::Forbidden),
        }
    }
}
