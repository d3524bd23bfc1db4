use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached order snapshot reserved for the future point-of-sale integration.
/// The `order_cache` table exists in the schema but nothing reads or writes
/// it yet; `recent_orders` in prompt context stays empty until it does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCacheEntry {
    pub id: i64,
    pub order_id: String,
    pub customer_email: Option<String>,
    pub order_data: String,
    pub last_updated: DateTime<Utc>,
}
