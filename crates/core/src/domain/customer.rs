use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal numeric customer id (SQLite rowid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity record for a social-media user. Unique on
/// `(social_media_id, platform)`; the store enforces this, not callers.
/// Contact fields are stored encrypted and only ever decrypted on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub social_media_id: String,
    pub platform: String,
    pub first_name: String,
    pub last_name: String,
    pub email_encrypted: Option<String>,
    pub phone_encrypted: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Display name used in prompt context; empty when both parts are blank.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Insert payload for a customer row. First contact from the chat pipeline
/// uses placeholder names; the customer-creation endpoint fills real ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub social_media_id: String,
    pub platform: String,
    pub first_name: String,
    pub last_name: String,
    pub email_encrypted: Option<String>,
    pub phone_encrypted: Option<String>,
}

impl NewCustomer {
    /// Placeholder record created on first message from an unseen
    /// `(social_media_id, platform)` pair.
    pub fn placeholder(social_media_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            social_media_id: social_media_id.into(),
            platform: platform.into(),
            first_name: "Social".to_string(),
            last_name: "User".to_string(),
            email_encrypted: None,
            phone_encrypted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NewCustomer;

    #[test]
    fn placeholder_customer_uses_generic_name() {
        let new = NewCustomer::placeholder("ig_1", "instagram");
        assert_eq!(new.first_name, "Social");
        assert_eq!(new.last_name, "User");
        assert!(new.email_encrypted.is_none());
    }
}
