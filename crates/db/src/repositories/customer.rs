use careline_core::chrono::{DateTime, Utc};
use careline_core::domain::customer::{Customer, CustomerId, NewCustomer};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, social_media_id, platform, first_name, last_name, \
             email_encrypted, phone_encrypted, created_at \
             FROM customers WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        row.as_ref().map(decode_customer).transpose()
    }

    async fn find_by_social_id(
        &self,
        social_media_id: &str,
        platform: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, social_media_id, platform, first_name, last_name, \
             email_encrypted, phone_encrypted, created_at \
             FROM customers WHERE social_media_id = ? AND platform = ?",
        )
        .bind(social_media_id)
        .bind(platform)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        row.as_ref().map(decode_customer).transpose()
    }

    async fn insert(&self, new_customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO customers \
             (social_media_id, platform, first_name, last_name, \
              email_encrypted, phone_encrypted, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_customer.social_media_id)
        .bind(&new_customer.platform)
        .bind(&new_customer.first_name)
        .bind(&new_customer.last_name)
        .bind(&new_customer.email_encrypted)
        .bind(&new_customer.phone_encrypted)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        Ok(Customer {
            id: CustomerId(result.last_insert_rowid()),
            social_media_id: new_customer.social_media_id,
            platform: new_customer.platform,
            first_name: new_customer.first_name,
            last_name: new_customer.last_name,
            email_encrypted: new_customer.email_encrypted,
            phone_encrypted: new_customer.phone_encrypted,
            created_at,
        })
    }

    async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, social_media_id, platform, first_name, last_name, \
             email_encrypted, phone_encrypted, created_at \
             FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        rows.iter().map(decode_customer).collect()
    }
}

fn decode_customer(row: &SqliteRow) -> Result<Customer, RepositoryError> {
    let created_at_raw: String =
        row.try_get("created_at").map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|error| RepositoryError::Decode(format!("bad created_at timestamp: {error}")))?
        .with_timezone(&Utc);

    Ok(Customer {
        id: CustomerId(
            row.try_get("id").map_err(|error| RepositoryError::Decode(error.to_string()))?,
        ),
        social_media_id: row
            .try_get("social_media_id")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        platform: row
            .try_get("platform")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        first_name: row
            .try_get("first_name")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        last_name: row
            .try_get("last_name")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        email_encrypted: row
            .try_get("email_encrypted")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        phone_encrypted: row
            .try_get("phone_encrypted")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        created_at,
    })
}
