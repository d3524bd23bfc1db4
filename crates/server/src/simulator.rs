//! Fake social-media traffic for investor demos.
//!
//! Nothing here sits on the real pipeline's path: the simulator only
//! fabricates inbound messages and keeps its own transcript so the demo
//! dashboard has something to show. State lives behind a `Mutex` owned by
//! the one instance bootstrap constructs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DemoUser {
    pub id: &'static str,
    pub name: &'static str,
    pub platform: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser { id: "ig_customer_001", name: "Sarah M.", platform: "instagram" },
    DemoUser { id: "wa_customer_002", name: "Mike T.", platform: "whatsapp" },
    DemoUser { id: "ig_customer_003", name: "Alex J.", platform: "instagram" },
    DemoUser { id: "wa_customer_004", name: "David L.", platform: "whatsapp" },
];

const DEMO_QUESTIONS: &[&str] = &[
    "Where is my order #ORD12345?",
    "Do you have this in blue?",
    "What's your return policy?",
    "How long does shipping take?",
    "Do you ship to Canada?",
    "My order arrived damaged, what should I do?",
    "What's the estimated delivery time?",
    "Can I change my shipping address?",
    "Do you have size guides?",
    "Is this product in stock?",
];

#[derive(Clone, Debug, Serialize)]
pub struct SimulatedMessage {
    pub platform: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub simulated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedSpeaker {
    Customer,
    Ai,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulatedTurn {
    pub speaker: SimulatedSpeaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DemoStatistics {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub platforms: HashMap<&'static str, usize>,
    pub active_demo_users: Vec<DemoUser>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DemoActivity {
    pub user: DemoUser,
    pub last_message: String,
    pub message_count: usize,
}

#[derive(Default)]
pub struct SocialSimulator {
    conversations: Mutex<HashMap<String, Vec<SimulatedTurn>>>,
}

impl SocialSimulator {
    /// Fabricate an inbound customer message. With no platform given, both
    /// roster and platform are sampled; an unknown platform yields `None`.
    pub fn simulate_incoming(&self, platform: Option<&str>) -> Option<SimulatedMessage> {
        let mut rng = rand::thread_rng();

        let candidates: Vec<&DemoUser> = match platform {
            Some(platform) => DEMO_USERS.iter().filter(|user| user.platform == platform).collect(),
            None => DEMO_USERS.iter().collect(),
        };
        let user = candidates.choose(&mut rng)?;
        let question = DEMO_QUESTIONS.choose(&mut rng)?;

        let message = SimulatedMessage {
            platform: user.platform.to_string(),
            user_id: user.id.to_string(),
            user_name: user.name.to_string(),
            message: (*question).to_string(),
            timestamp: Utc::now(),
            simulated: true,
        };

        self.record(&message.user_id, SimulatedSpeaker::Customer, &message.message);
        Some(message)
    }

    /// Record the AI side of an exchange and shape it like an outbound
    /// platform message.
    pub fn record_reply(&self, user_id: &str, reply: &str) -> SimulatedMessage {
        let user = DEMO_USERS.iter().find(|user| user.id == user_id);

        self.record(user_id, SimulatedSpeaker::Ai, reply);

        SimulatedMessage {
            platform: user.map(|user| user.platform).unwrap_or("unknown").to_string(),
            user_id: user_id.to_string(),
            user_name: "AI Assistant".to_string(),
            message: reply.to_string(),
            timestamp: Utc::now(),
            simulated: true,
        }
    }

    pub fn history(&self, user_id: &str) -> Vec<SimulatedTurn> {
        self.transcript().get(user_id).cloned().unwrap_or_default()
    }

    pub fn statistics(&self) -> DemoStatistics {
        let conversations = self.transcript();

        let mut platforms = HashMap::new();
        for user in DEMO_USERS {
            *platforms.entry(user.platform).or_insert(0) += 1;
        }

        DemoStatistics {
            total_conversations: conversations.len(),
            total_messages: conversations.values().map(Vec::len).sum(),
            platforms,
            active_demo_users: DEMO_USERS.to_vec(),
        }
    }

    /// Latest exchange per roster user, for the dashboard's activity feed.
    pub fn recent_activity(&self, limit: usize) -> Vec<DemoActivity> {
        let conversations = self.transcript();

        DEMO_USERS
            .iter()
            .take(limit)
            .filter_map(|user| {
                let turns = conversations.get(user.id)?;
                let last = turns.last()?;
                Some(DemoActivity {
                    user: *user,
                    last_message: last.message.clone(),
                    message_count: turns.len(),
                })
            })
            .collect()
    }

    fn record(&self, user_id: &str, speaker: SimulatedSpeaker, message: &str) {
        self.transcript().entry(user_id.to_string()).or_default().push(SimulatedTurn {
            speaker,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn transcript(&self) -> MutexGuard<'_, HashMap<String, Vec<SimulatedTurn>>> {
        self.conversations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
