//! Reply generation behind a fixed model fallback ladder.

use careline_core::escalation::should_escalate;
use careline_core::intent::{classify_intent, Intent};
use tracing::{error, info, warn};

use crate::context::CustomerContext;
use crate::llm::{ChatMessage, CompletionClient, CompletionRequest};

/// Model identifiers tried strictly in order, once each. No backoff, no
/// racing, no memory of which one answered last time.
const FALLBACK_MODELS: &[&str] =
    &["llama-3.1-8b-instant", "llama3-8b-8192", "mixtral-8x7b-32768"];

const TEMPERATURE: f32 = 0.7;
const MAX_COMPLETION_TOKENS: u32 = 500;

/// At most this many history messages make it into the prompt, counted from
/// the newest end of the reshaped transcript.
const PROMPT_HISTORY_WINDOW: usize = 6;

const SYSTEM_PROMPT: &str = "You are a friendly and helpful customer service agent for an e-commerce store.
Your goal is to assist customers with their inquiries in a professional, empathetic manner.

KEY RESPONSE GUIDELINES:
1. Be warm, friendly, and professional
2. If you don't have specific order data, guide customers on how to find it
3. For order status inquiries, ask for order number or email
4. For product questions, be helpful but suggest checking the website for latest inventory
5. Escalate to human agent for complex returns, complaints, or technical issues
6. Always maintain brand voice - helpful, efficient, and caring

COMMON SCENARIOS:
- Order Status: \"I'd be happy to check your order status! Do you have your order number or the email used for purchase?\"
- Product Info: \"I can help with general product information! For specific inventory and pricing, our website has the most up-to-date details.\"
- Shipping: \"For shipping questions, I'll need your order number to look up the latest tracking information.\"
- Returns: \"For returns and exchanges, I'll connect you with our specialist team who can process this for you.\"
- General Help: \"I'm here to help! What can I assist you with today?\"

Always be honest about what information you have access to. If you need specific data from our systems, let the customer know what information you need to help them.";

const FALLBACK_RESPONSE: &str = "I'd be happy to help you with your question about blue t-shirts! \
For the most current inventory information, I recommend checking our website as it has real-time \
stock updates. Is there a specific size or style you're looking for?";

/// Outcome bundle for one processed message. `confidence` is 0.9 for a
/// model-written reply and 0.0 for the canned fallback; the pipeline does
/// not forward it to callers.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedReply {
    pub response_text: String,
    pub intent: Intent,
    pub requires_human: bool,
    pub confidence: f32,
}

/// One ladder pass: either some model completed, or every rung failed.
enum LadderOutcome {
    Completed { model: &'static str, text: String },
    Exhausted,
}

pub struct ResponseGenerator<C> {
    client: C,
}

impl<C: CompletionClient> ResponseGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Generate a reply. Infallible by contract: when the whole ladder
    /// fails, the caller gets the canned fallback payload, never an error.
    ///
    /// Intent and escalation are computed from the customer's original
    /// message, not the model's reply.
    pub async fn generate(
        &self,
        user_message: &str,
        context: &CustomerContext,
        history: &[ChatMessage],
    ) -> GeneratedReply {
        let system_prompt = build_system_prompt(context);

        match self.try_models(&system_prompt, user_message, history).await {
            LadderOutcome::Completed { model, text } => {
                let intent = classify_intent(user_message);
                let requires_human = should_escalate(intent, user_message);
                info!(
                    event_name = "agent.ladder.completed",
                    model,
                    intent = %intent,
                    requires_human,
                    "hosted model produced a reply"
                );
                GeneratedReply { response_text: text, intent, requires_human, confidence: 0.9 }
            }
            LadderOutcome::Exhausted => {
                error!(
                    event_name = "agent.ladder.exhausted",
                    models = FALLBACK_MODELS.len(),
                    "all models failed, serving fallback response"
                );
                GeneratedReply {
                    response_text: FALLBACK_RESPONSE.to_string(),
                    intent: Intent::ProductInfo,
                    requires_human: false,
                    confidence: 0.0,
                }
            }
        }
    }

    async fn try_models(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: &[ChatMessage],
    ) -> LadderOutcome {
        for model in FALLBACK_MODELS.iter().copied() {
            let request = CompletionRequest {
                model: model.to_string(),
                messages: prompt_messages(system_prompt, user_message, history),
                temperature: TEMPERATURE,
                max_tokens: MAX_COMPLETION_TOKENS,
            };

            match self.client.complete(&request).await {
                Ok(text) => return LadderOutcome::Completed { model, text },
                Err(error) => {
                    warn!(
                        event_name = "agent.ladder.attempt_failed",
                        model,
                        error = %error,
                        "model attempt failed, advancing the ladder"
                    );
                }
            }
        }

        LadderOutcome::Exhausted
    }
}

fn prompt_messages(
    system_prompt: &str,
    user_message: &str,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let window_start = history.len().saturating_sub(PROMPT_HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(2 + PROMPT_HISTORY_WINDOW);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history[window_start..].iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}

fn build_system_prompt(context: &CustomerContext) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();

    prompt.push_str("\n\nCUSTOMER CONTEXT:\n");
    if !context.recent_orders.is_empty() {
        prompt.push_str(&format!("- Recent orders: {} orders\n", context.recent_orders.len()));
    }
    if !context.customer_name.is_empty() {
        prompt.push_str(&format!("- Customer name: {}\n", context.customer_name));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use careline_core::intent::Intent;
    use reqwest::StatusCode;

    use super::{ResponseGenerator, FALLBACK_RESPONSE};
    use crate::context::CustomerContext;
    use crate::llm::{ChatMessage, CompletionClient, CompletionError, CompletionRequest};

    /// Answers every attempt with the same canned text, recording requests.
    #[derive(Clone)]
    struct RecordingClient {
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
        reply: Option<String>,
    }

    impl RecordingClient {
        fn succeeding(reply: &str) -> Self {
            Self { requests: Arc::new(Mutex::new(Vec::new())), reply: Some(reply.to_string()) }
        }

        fn failing() -> Self {
            Self { requests: Arc::new(Mutex::new(Vec::new())), reply: None }
        }

        fn recorded(&self) -> Vec<CompletionRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.requests.lock().expect("lock").push(request.clone());
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(CompletionError::Status {
                    model: request.model.clone(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                }),
            }
        }
    }

    fn context() -> CustomerContext {
        CustomerContext {
            customer_name: "Sarah M.".to_string(),
            customer_email: String::new(),
            recent_orders: Vec::new(),
            conversation_count: 0,
        }
    }

    #[tokio::test]
    async fn first_success_stops_the_ladder_and_classifies_the_user_message() {
        let client = RecordingClient::succeeding("Let me check that for you.");
        let generator = ResponseGenerator::new(client.clone());

        let reply = generator.generate("Where is my order #555?", &context(), &[]).await;

        assert_eq!(reply.response_text, "Let me check that for you.");
        assert_eq!(reply.intent, Intent::OrderStatus);
        assert!(!reply.requires_human);
        assert_eq!(reply.confidence, 0.9);

        let requests = client.recorded();
        assert_eq!(requests.len(), 1, "no further models after a success");
        assert_eq!(requests[0].model, "llama-3.1-8b-instant");
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].max_tokens, 500);
    }

    #[tokio::test]
    async fn escalation_policy_applies_to_model_successes() {
        let client = RecordingClient::succeeding("I understand your frustration.");
        let generator = ResponseGenerator::new(client.clone());

        let reply = generator.generate("I need to return this jacket", &context(), &[]).await;

        assert_eq!(reply.intent, Intent::Returns);
        assert!(reply.requires_human, "returns intent always hands off");
    }

    #[tokio::test]
    async fn exhausted_ladder_degrades_to_the_fallback_payload() {
        let client = RecordingClient::failing();
        let generator = ResponseGenerator::new(client.clone());

        let reply = generator.generate("do you have this in blue?", &context(), &[]).await;

        assert_eq!(reply.response_text, FALLBACK_RESPONSE);
        assert_eq!(reply.intent, Intent::ProductInfo);
        assert!(!reply.requires_human);
        assert_eq!(reply.confidence, 0.0);

        let attempted: Vec<String> =
            client.recorded().into_iter().map(|request| request.model).collect();
        assert_eq!(attempted, ["llama-3.1-8b-instant", "llama3-8b-8192", "mixtral-8x7b-32768"]);
    }

    #[tokio::test]
    async fn prompt_keeps_only_the_last_six_history_messages() {
        let client = RecordingClient::succeeding("ok");
        let generator = ResponseGenerator::new(client.clone());

        let history: Vec<ChatMessage> = (1..=5)
            .flat_map(|n| {
                [ChatMessage::user(format!("question {n}")), ChatMessage::assistant(format!("answer {n}"))]
            })
            .collect();

        generator.generate("one more question", &context(), &history).await;

        let request = client.recorded().remove(0);
        // system + 6 history + new user message
        assert_eq!(request.messages.len(), 8);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "question 3");
        assert_eq!(request.messages[6].content, "answer 5");
        assert_eq!(request.messages[7].content, "one more question");
    }

    #[tokio::test]
    async fn system_prompt_mentions_the_customer_when_known() {
        let client = RecordingClient::succeeding("ok");
        let generator = ResponseGenerator::new(client.clone());

        generator.generate("hello", &context(), &[]).await;

        let request = client.recorded().remove(0);
        assert!(request.messages[0].content.contains("CUSTOMER CONTEXT"));
        assert!(request.messages[0].content.contains("Customer name: Sarah M."));
        assert!(!request.messages[0].content.contains("Recent orders"));
    }
}
