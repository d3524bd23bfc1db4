use async_trait::async_trait;
use thiserror::Error;

use careline_core::domain::conversation::{ConversationTurn, NewConversationTurn};
use careline_core::domain::customer::{Customer, CustomerId, NewCustomer};

pub mod conversation;
pub mod customer;
pub mod memory;

pub use conversation::SqlConversationRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{InMemoryConversationRepository, InMemoryCustomerRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),
}

impl RepositoryError {
    /// Translate a sqlx error, surfacing unique-key conflicts as their own
    /// variant so callers can map them to a client error instead of a 5xx.
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return Self::UniqueViolation(db_error.to_string());
            }
        }
        Self::Database(error)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

/// Customer identity storage. Uniqueness of `(social_media_id, platform)` is
/// owned by the schema; `insert` surfaces a violation rather than resolving
/// the race in application code.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_social_id(
        &self,
        social_media_id: &str,
        platform: &str,
    ) -> Result<Option<Customer>, RepositoryError>;

    async fn insert(&self, new_customer: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn list(&self) -> Result<Vec<Customer>, RepositoryError>;
}

/// Append-only conversation log.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn append(&self, turn: NewConversationTurn)
        -> Result<ConversationTurn, RepositoryError>;

    /// Most recent turns, newest first. Callers that feed prompt context must
    /// reverse to oldest-first themselves.
    async fn recent_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, RepositoryError>;

    /// Full history, oldest first (the shape the history endpoint serves).
    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError>;

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<i64, RepositoryError>;
}
