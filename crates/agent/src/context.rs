//! Prompt context assembly.

use careline_core::domain::conversation::ConversationTurn;
use careline_core::domain::order::OrderCacheEntry;

use crate::llm::ChatMessage;

/// Customer-facing context handed to the response generator. `recent_orders`
/// stays empty until the point-of-sale integration populates the order
/// cache; `customer_email` is already decrypted ("" when absent).
#[derive(Clone, Debug, Default)]
pub struct CustomerContext {
    pub customer_name: String,
    pub customer_email: String,
    pub recent_orders: Vec<OrderCacheEntry>,
    pub conversation_count: i64,
}

/// Reshape stored turns into the prompt's chat transcript.
///
/// The store hands back turns newest-first; the transcript must read
/// oldest-first, one user message followed by one assistant message per
/// turn (up to 20 entries for the 10-turn fetch window).
pub fn history_messages(turns_newest_first: &[ConversationTurn]) -> Vec<ChatMessage> {
    let mut history = Vec::with_capacity(turns_newest_first.len() * 2);

    for turn in turns_newest_first.iter().rev() {
        history.push(ChatMessage::user(turn.message_text.clone()));
        history.push(ChatMessage::assistant(turn.ai_response.clone()));
    }

    history
}
