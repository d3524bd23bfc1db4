//! End-to-end processing of one inbound customer message.

use std::sync::Arc;

use careline_core::crypto::{mask, CryptoError, FieldCipher};
use careline_core::domain::conversation::NewConversationTurn;
use careline_core::domain::customer::{Customer, CustomerId, NewCustomer};
use careline_core::intent::{suggested_actions, Intent};
use careline_db::repositories::{ConversationRepository, CustomerRepository, RepositoryError};
use thiserror::Error;
use tracing::info;

use crate::context::{history_messages, CustomerContext};
use crate::llm::CompletionClient;
use crate::responder::ResponseGenerator;

/// How many persisted turns are fetched for prompt context. The responder
/// narrows the reshaped transcript further to its own prompt window.
const HISTORY_TURN_LIMIT: u32 = 10;

/// What callers of the chat surface receive. Generation confidence is
/// deliberately not part of this bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedMessage {
    pub response_text: String,
    pub intent: Intent,
    pub requires_human: bool,
    pub customer_id: CustomerId,
    pub suggested_actions: Vec<String>,
}

/// Store failures are the only hard failures here; the response generator
/// absorbs every hosted-model problem internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub struct ConversationPipeline<C> {
    customers: Arc<dyn CustomerRepository>,
    conversations: Arc<dyn ConversationRepository>,
    generator: ResponseGenerator<C>,
    cipher: FieldCipher,
}

impl<C: CompletionClient> ConversationPipeline<C> {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        conversations: Arc<dyn ConversationRepository>,
        generator: ResponseGenerator<C>,
        cipher: FieldCipher,
    ) -> Self {
        Self { customers, conversations, generator, cipher }
    }

    /// Process one inbound message: resolve the customer, assemble context,
    /// generate a reply, persist the turn (unconditionally, fallback
    /// replies included), and attach suggested next actions.
    pub async fn process_message(
        &self,
        user_message: &str,
        social_media_id: &str,
        platform: &str,
    ) -> Result<ProcessedMessage, PipelineError> {
        let customer = self.resolve_customer(social_media_id, platform).await?;

        let recent_turns =
            self.conversations.recent_for_customer(customer.id, HISTORY_TURN_LIMIT).await?;
        let history = history_messages(&recent_turns);

        let customer_email = match &customer.email_encrypted {
            Some(encrypted) => self.cipher.decrypt(encrypted)?,
            None => String::new(),
        };
        let context = CustomerContext {
            customer_name: customer.display_name(),
            customer_email,
            // Stays empty until the point-of-sale integration lands.
            recent_orders: Vec::new(),
            conversation_count: self.conversations.count_for_customer(customer.id).await?,
        };

        let reply = self.generator.generate(user_message, &context, &history).await;

        self.conversations
            .append(NewConversationTurn {
                customer_id: customer.id,
                platform: platform.to_string(),
                message_text: user_message.to_string(),
                ai_response: reply.response_text.clone(),
                intent: reply.intent,
                requires_human: reply.requires_human,
            })
            .await?;
        info!(
            event_name = "chat.pipeline.turn_persisted",
            customer_id = %customer.id,
            intent = %reply.intent,
            requires_human = reply.requires_human,
            "conversation turn persisted"
        );

        Ok(ProcessedMessage {
            response_text: reply.response_text,
            intent: reply.intent,
            requires_human: reply.requires_human,
            customer_id: customer.id,
            suggested_actions: suggested_actions(reply.intent.as_str())
                .iter()
                .map(|action| (*action).to_string())
                .collect(),
        })
    }

    /// Lookup-then-insert on `(social_media_id, platform)`. The schema's
    /// unique constraint arbitrates concurrent first contacts; this code
    /// does not try to.
    async fn resolve_customer(
        &self,
        social_media_id: &str,
        platform: &str,
    ) -> Result<Customer, PipelineError> {
        if let Some(customer) =
            self.customers.find_by_social_id(social_media_id, platform).await?
        {
            return Ok(customer);
        }

        let customer =
            self.customers.insert(NewCustomer::placeholder(social_media_id, platform)).await?;
        info!(
            event_name = "chat.pipeline.customer_created",
            customer_id = %customer.id,
            platform,
            social_media_id = %mask(social_media_id),
            "created customer on first contact"
        );
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use careline_core::crypto::FieldCipher;
    use careline_core::intent::Intent;
    use careline_db::repositories::{
        ConversationRepository, CustomerRepository, InMemoryConversationRepository,
        InMemoryCustomerRepository,
    };
    use reqwest::StatusCode;
    use secrecy::SecretString;

    use super::ConversationPipeline;
    use crate::llm::{CompletionClient, CompletionError, CompletionRequest};
    use crate::responder::ResponseGenerator;

    #[derive(Clone)]
    struct ScriptedClient {
        reply: Option<String>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl ScriptedClient {
        fn succeeding(reply: &str) -> Self {
            Self { reply: Some(reply.to_string()), requests: Arc::new(Mutex::new(Vec::new())) }
        }

        fn failing() -> Self {
            Self { reply: None, requests: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.requests.lock().expect("lock").push(request.clone());
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(CompletionError::Status {
                    model: request.model.clone(),
                    status: StatusCode::BAD_GATEWAY,
                }),
            }
        }
    }

    struct Harness {
        customers: Arc<InMemoryCustomerRepository>,
        conversations: Arc<InMemoryConversationRepository>,
        pipeline: ConversationPipeline<ScriptedClient>,
        client: ScriptedClient,
    }

    fn harness(client: ScriptedClient) -> Harness {
        let customers = Arc::new(InMemoryCustomerRepository::default());
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let cipher = FieldCipher::new(&SecretString::from("pipeline-test-passphrase".to_string()))
            .expect("cipher");
        let pipeline = ConversationPipeline::new(
            customers.clone(),
            conversations.clone(),
            ResponseGenerator::new(client.clone()),
            cipher,
        );
        Harness { customers, conversations, pipeline, client }
    }

    #[tokio::test]
    async fn first_message_creates_customer_and_persists_one_turn() {
        let h = harness(ScriptedClient::succeeding("Happy to check on order #555 for you!"));

        let result = h
            .pipeline
            .process_message("Where is my order #555?", "ig_1", "instagram")
            .await
            .expect("process");

        assert_eq!(result.intent, Intent::OrderStatus);
        assert!(!result.requires_human);
        assert_eq!(result.suggested_actions[0], "Ask for order number");

        let customers = h.customers.list().await.expect("list");
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, result.customer_id);
        assert_eq!(customers[0].first_name, "Social");

        let turns = h.conversations.list_for_customer(result.customer_id).await.expect("turns");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].message_text, "Where is my order #555?");
        assert_eq!(turns[0].ai_response, "Happy to check on order #555 for you!");
    }

    #[tokio::test]
    async fn resolving_the_same_identity_twice_reuses_the_customer() {
        let h = harness(ScriptedClient::succeeding("hi again"));

        let first =
            h.pipeline.process_message("hello", "ig_1", "instagram").await.expect("first");
        let second =
            h.pipeline.process_message("hello again", "ig_1", "instagram").await.expect("second");

        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(h.customers.list().await.expect("list").len(), 1);
        assert_eq!(
            h.conversations.count_for_customer(first.customer_id).await.expect("count"),
            2
        );
    }

    #[tokio::test]
    async fn generator_exhaustion_still_persists_the_turn_and_answers_cleanly() {
        let h = harness(ScriptedClient::failing());

        let result =
            h.pipeline.process_message("anyone there?", "wa_9", "whatsapp").await.expect("process");

        assert_eq!(result.intent, Intent::ProductInfo);
        assert!(!result.requires_human);
        assert!(result.response_text.contains("blue t-shirts"));

        let turns = h.conversations.list_for_customer(result.customer_id).await.expect("turns");
        assert_eq!(turns.len(), 1, "fallback replies are persisted like any other");
        assert_eq!(turns[0].ai_response, result.response_text);
    }

    #[tokio::test]
    async fn prior_turns_reach_the_prompt_oldest_first() {
        let h = harness(ScriptedClient::succeeding("noted"));

        h.pipeline.process_message("first message", "ig_1", "instagram").await.expect("one");
        h.pipeline.process_message("second message", "ig_1", "instagram").await.expect("two");
        h.pipeline.process_message("third message", "ig_1", "instagram").await.expect("three");

        let requests = h.client.requests.lock().expect("lock");
        let last_request = requests.last().expect("at least one request");

        // system + 2 prior turns (4 messages) + new user message
        assert_eq!(last_request.messages.len(), 6);
        assert_eq!(last_request.messages[1].content, "first message");
        assert_eq!(last_request.messages[2].content, "noted");
        assert_eq!(last_request.messages[3].content, "second message");
        assert_eq!(last_request.messages[5].content, "third message");
    }

    #[tokio::test]
    async fn placeholder_name_reaches_the_system_prompt() {
        let h = harness(ScriptedClient::succeeding("hello"));

        h.pipeline.process_message("hi", "ig_1", "instagram").await.expect("process");

        let requests = h.client.requests.lock().expect("lock");
        assert!(requests[0].messages[0].content.contains("Customer name: Social User"));
    }
}
