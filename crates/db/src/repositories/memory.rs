//! In-memory repository doubles for pipeline and handler tests. They mirror
//! the SQL implementations' observable behavior, including the
//! `(social_media_id, platform)` uniqueness rule and newest-first ordering.

use careline_core::chrono::Utc;
use careline_core::domain::conversation::{ConversationId, ConversationTurn, NewConversationTurn};
use careline_core::domain::customer::{Customer, CustomerId, NewCustomer};
use tokio::sync::RwLock;

use super::{ConversationRepository, CustomerRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    inner: RwLock<CustomerStore>,
}

#[derive(Default)]
struct CustomerStore {
    customers: Vec<Customer>,
    next_id: i64,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.customers.iter().find(|customer| customer.id == id).cloned())
    }

    async fn find_by_social_id(
        &self,
        social_media_id: &str,
        platform: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store
            .customers
            .iter()
            .find(|customer| {
                customer.social_media_id == social_media_id && customer.platform == platform
            })
            .cloned())
    }

    async fn insert(&self, new_customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut store = self.inner.write().await;

        let duplicate = store.customers.iter().any(|customer| {
            customer.social_media_id == new_customer.social_media_id
                && customer.platform == new_customer.platform
        });
        if duplicate {
            return Err(RepositoryError::UniqueViolation(format!(
                "customers.social_media_id, customers.platform: ({}, {})",
                new_customer.social_media_id, new_customer.platform
            )));
        }

        store.next_id += 1;
        let customer = Customer {
            id: CustomerId(store.next_id),
            social_media_id: new_customer.social_media_id,
            platform: new_customer.platform,
            first_name: new_customer.first_name,
            last_name: new_customer.last_name,
            email_encrypted: new_customer.email_encrypted,
            phone_encrypted: new_customer.phone_encrypted,
            created_at: Utc::now(),
        };
        store.customers.push(customer.clone());
        Ok(customer)
    }

    async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.customers.clone())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    inner: RwLock<ConversationStore>,
}

#[derive(Default)]
struct ConversationStore {
    turns: Vec<ConversationTurn>,
    next_id: i64,
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn append(
        &self,
        turn: NewConversationTurn,
    ) -> Result<ConversationTurn, RepositoryError> {
        let mut store = self.inner.write().await;
        store.next_id += 1;
        let stored = ConversationTurn {
            id: ConversationId(store.next_id),
            customer_id: turn.customer_id,
            platform: turn.platform,
            message_text: turn.message_text,
            ai_response: turn.ai_response,
            intent: turn.intent,
            requires_human: turn.requires_human,
            created_at: Utc::now(),
        };
        store.turns.push(stored.clone());
        Ok(stored)
    }

    async fn recent_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store
            .turns
            .iter()
            .filter(|turn| turn.customer_id == customer_id)
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store
            .turns
            .iter()
            .filter(|turn| turn.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.turns.iter().filter(|turn| turn.customer_id == customer_id).count() as i64)
    }
}
