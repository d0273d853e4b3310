//! In-process store.
//!
//! All collections live behind one `RwLock`, so every multi-step operation
//! (duplicate check + insert, order update + payment append) runs under a
//! single write guard and is atomic with respect to other requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tool_market_core::{Email, OrderId, PaymentId, ReviewId, Role, ToolId};

use super::{PaymentOutcome, PlaceOrder, RepositoryError, Store, Upserted};
use crate::models::{
    NewOrder, NewReview, NewTool, Order, PaymentRecord, Profile, ProfileUpdate, Review, Tool,
    User, UserUpdate,
};

#[derive(Default)]
struct Collections {
    tools: Vec<Tool>,
    users: BTreeMap<Email, User>,
    orders: Vec<Order>,
    payments: Vec<PaymentRecord>,
    reviews: Vec<Review>,
    profiles: BTreeMap<Email, Profile>,
}

/// Memory-backed [`Store`]. Insertion order is preserved for listings.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, RepositoryError> {
        Ok(self.data.read().await.tools.clone())
    }

    async fn get_tool(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.tools.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tool_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.tools.iter().find(|t| t.name == name).cloned())
    }

    async fn create_tool(&self, tool: NewTool) -> Result<Tool, RepositoryError> {
        let tool = Tool {
            id: ToolId::new_random(),
            name: tool.name,
            description: tool.description,
            image: tool.image,
            price: tool.price,
            min_order_quantity: tool.min_order_quantity,
            available_quantity: tool.available_quantity,
            created_at: Utc::now(),
        };
        self.data.write().await.tools.push(tool.clone());
        Ok(tool)
    }

    async fn delete_tool(&self, id: ToolId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.tools.len();
        data.tools.retain(|t| t.id != id);
        Ok(data.tools.len() < before)
    }

    async fn upsert_user(
        &self,
        email: &Email,
        update: UserUpdate,
    ) -> Result<Upserted<User>, RepositoryError> {
        let now = Utc::now();
        let mut data = self.data.write().await;

        if let Some(user) = data.users.get_mut(email) {
            if update.name.is_some() {
                user.name = update.name;
            }
            user.updated_at = now;
            return Ok(Upserted {
                record: user.clone(),
                created: false,
            });
        }

        let user = User {
            email: email.clone(),
            name: update.name,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };
        data.users.insert(email.clone(), user.clone());
        Ok(Upserted {
            record: user,
            created: true,
        })
    }

    async fn get_user(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.data.read().await.users.get(email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.data.read().await.users.values().cloned().collect())
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<User>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.users.get_mut(email).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn place_order(&self, order: NewOrder) -> Result<PlaceOrder, RepositoryError> {
        let mut data = self.data.write().await;

        if let Some(existing) = data
            .orders
            .iter()
            .find(|o| o.tool_name == order.tool_name && o.email == order.email)
        {
            return Ok(PlaceOrder::Existing(existing.clone()));
        }

        let order = Order {
            id: OrderId::new_random(),
            tool_name: order.tool_name,
            email: order.email,
            customer_name: order.customer_name,
            quantity: order.quantity,
            price: order.price,
            address: order.address,
            phone: order.phone,
            paid: false,
            transaction_id: None,
            admin_accept: None,
            created_at: Utc::now(),
        };
        data.orders.push(order.clone());
        Ok(PlaceOrder::Created(order))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .orders
            .iter()
            .filter(|o| &o.email == email)
            .cloned()
            .collect())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.data.read().await.orders.clone())
    }

    async fn record_payment(
        &self,
        id: OrderId,
        transaction_id: &str,
    ) -> Result<PaymentOutcome, RepositoryError> {
        let mut data = self.data.write().await;

        let Some(order) = data.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(PaymentOutcome::NotFound);
        };
        if order.paid {
            return Ok(PaymentOutcome::AlreadyPaid(order.clone()));
        }

        order.paid = true;
        order.transaction_id = Some(transaction_id.to_owned());
        let order = order.clone();

        let payment = PaymentRecord {
            id: PaymentId::new_random(),
            order_id: order.id,
            transaction_id: transaction_id.to_owned(),
            email: order.email.clone(),
            amount: order.price,
            created_at: Utc::now(),
        };
        data.payments.push(payment.clone());

        Ok(PaymentOutcome::Recorded { order, payment })
    }

    async fn accept_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.admin_accept = Some(true);
            order.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.orders.len();
        data.orders.retain(|o| o.id != id);
        Ok(data.orders.len() < before)
    }

    async fn list_payments_for(
        &self,
        order: OrderId,
    ) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .payments
            .iter()
            .filter(|p| p.order_id == order)
            .cloned()
            .collect())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.reviews.iter().rev().cloned().collect())
    }

    async fn create_review(
        &self,
        author: &Email,
        review: NewReview,
    ) -> Result<Review, RepositoryError> {
        let review = Review {
            id: ReviewId::new_random(),
            email: author.clone(),
            name: review.name,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.data.write().await.reviews.push(review.clone());
        Ok(review)
    }

    async fn get_profile(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.data.read().await.profiles.get(email).cloned())
    }

    async fn upsert_profile(
        &self,
        email: &Email,
        update: ProfileUpdate,
    ) -> Result<Upserted<Profile>, RepositoryError> {
        let mut data = self.data.write().await;
        let existing = data.profiles.remove(email);
        let created = existing.is_none();
        let profile = update.apply(email, existing, Utc::now());
        data.profiles.insert(email.clone(), profile.clone());
        Ok(Upserted {
            record: profile,
            created,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tool_market_core::Price;

    use super::*;

    fn new_order(tool: &str, email: &str) -> NewOrder {
        NewOrder {
            tool_name: tool.to_owned(),
            email: Email::parse(email).unwrap(),
            customer_name: None,
            quantity: 1,
            price: Price::new(10.into()).unwrap(),
            address: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_is_guarded_per_pair() {
        let store = MemoryStore::new();

        let PlaceOrder::Created(first) = store.place_order(new_order("Drill", "a@x.com")).await.unwrap()
        else {
            panic!("first order should be created");
        };
        let second = store.place_order(new_order("Drill", "a@x.com")).await.unwrap();
        assert_eq!(second, PlaceOrder::Existing(first));

        // Different tool or different purchaser is a different pair.
        assert!(matches!(
            store.place_order(new_order("Saw", "a@x.com")).await.unwrap(),
            PlaceOrder::Created(_)
        ));
        assert!(matches!(
            store.place_order(new_order("Drill", "b@x.com")).await.unwrap(),
            PlaceOrder::Created(_)
        ));
        assert_eq!(store.list_orders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_insert_once() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.place_order(new_order("Drill", "a@x.com")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_payment_once() {
        let store = MemoryStore::new();
        let PlaceOrder::Created(order) = store.place_order(new_order("Drill", "a@x.com")).await.unwrap()
        else {
            panic!("order should be created");
        };

        let outcome = store.record_payment(order.id, "tx1").await.unwrap();
        let PaymentOutcome::Recorded { order: paid, payment } = outcome else {
            panic!("payment should be recorded");
        };
        assert!(paid.paid);
        assert_eq!(paid.transaction_id.as_deref(), Some("tx1"));
        assert_eq!(payment.order_id, order.id);

        assert!(matches!(
            store.record_payment(order.id, "tx2").await.unwrap(),
            PaymentOutcome::AlreadyPaid(_)
        ));
        assert_eq!(store.list_payments_for(order.id).await.unwrap().len(), 1);
        assert_eq!(
            store.record_payment(OrderId::new_random(), "tx3").await.unwrap(),
            PaymentOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_order_keeps_payment_log() {
        let store = MemoryStore::new();
        let PlaceOrder::Created(order) = store.place_order(new_order("Drill", "a@x.com")).await.unwrap()
        else {
            panic!("order should be created");
        };
        store.record_payment(order.id, "tx1").await.unwrap();

        assert!(store.delete_order(order.id).await.unwrap());
        assert!(!store.delete_order(order.id).await.unwrap());
        assert_eq!(store.list_payments_for(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_user_never_touches_role() {
        let store = MemoryStore::new();
        let email = Email::parse("a@x.com").unwrap();

        let first = store.upsert_user(&email, UserUpdate::default()).await.unwrap();
        assert!(first.created);
        assert_eq!(first.record.role, Role::User);

        store.set_role(&email, Role::Admin).await.unwrap();
        let again = store
            .upsert_user(&email, UserUpdate { name: Some("Ann".to_owned()) })
            .await
            .unwrap();
        assert!(!again.created);
        assert_eq!(again.record.role, Role::Admin);
        assert_eq!(again.record.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_set_role_on_unknown_identity() {
        let store = MemoryStore::new();
        let email = Email::parse("ghost@x.com").unwrap();
        assert_eq!(store.set_role(&email, Role::Admin).await.unwrap(), None);
        assert_eq!(store.get_user(&email).await.unwrap(), None);
    }
}
