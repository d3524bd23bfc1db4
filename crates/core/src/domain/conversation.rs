use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::intent::Intent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

/// One persisted message/response exchange. Append-only: turns are never
/// updated or deleted, and ordering is by `created_at` (id breaks ties).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: ConversationId,
    pub customer_id: CustomerId,
    pub platform: String,
    pub message_text: String,
    pub ai_response: String,
    pub intent: Intent,
    pub requires_human: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewConversationTurn {
    pub customer_id: CustomerId,
    pub platform: String,
    pub message_text: String,
    pub ai_response: String,
    pub intent: Intent,
    pub requires_human: bool,
}
