use careline_core::chrono::{DateTime, Utc};
use careline_core::domain::conversation::{ConversationId, ConversationTurn, NewConversationTurn};
use careline_core::domain::customer::CustomerId;
use careline_core::intent::Intent;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn append(
        &self,
        turn: NewConversationTurn,
    ) -> Result<ConversationTurn, RepositoryError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO conversations \
             (customer_id, platform, message_text, ai_response, intent, \
              requires_human, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(turn.customer_id.0)
        .bind(&turn.platform)
        .bind(&turn.message_text)
        .bind(&turn.ai_response)
        .bind(turn.intent.as_str())
        .bind(turn.requires_human)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        Ok(ConversationTurn {
            id: ConversationId(result.last_insert_rowid()),
            customer_id: turn.customer_id,
            platform: turn.platform,
            message_text: turn.message_text,
            ai_response: turn.ai_response,
            intent: turn.intent,
            requires_human: turn.requires_human,
            created_at,
        })
    }

    async fn recent_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, customer_id, platform, message_text, ai_response, intent, \
             requires_human, created_at \
             FROM conversations WHERE customer_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(customer_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        rows.iter().map(decode_turn).collect()
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, customer_id, platform, message_text, ai_response, intent, \
             requires_human, created_at \
             FROM conversations WHERE customer_id = ? \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(customer_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        rows.iter().map(decode_turn).collect()
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM conversations WHERE customer_id = ?")
                .bind(customer_id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from_sqlx)?;

        Ok(count)
    }
}

fn decode_turn(row: &SqliteRow) -> Result<ConversationTurn, RepositoryError> {
    let created_at_raw: String =
        row.try_get("created_at").map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|error| RepositoryError::Decode(format!("bad created_at timestamp: {error}")))?
        .with_timezone(&Utc);

    let intent_label: String =
        row.try_get("intent").map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let intent = Intent::parse(&intent_label)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown intent label `{intent_label}`")))?;

    Ok(ConversationTurn {
        id: ConversationId(
            row.try_get("id").map_err(|error| RepositoryError::Decode(error.to_string()))?,
        ),
        customer_id: CustomerId(
            row.try_get("customer_id")
                .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        ),
        platform: row
            .try_get("platform")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        message_text: row
            .try_get("message_text")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        ai_response: row
            .try_get("ai_response")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        intent,
        requires_human: row
            .try_get("requires_human")
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        created_at,
    })
}
