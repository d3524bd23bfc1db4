//! Conversation processing - hosted-model replies with deterministic guardrails
//!
//! This crate is the "brain" of careline: it turns an inbound customer
//! message into a reply, an intent classification, and an escalation flag.
//!
//! # Architecture
//!
//! Processing follows a fixed sequence:
//! 1. **Customer resolution** (`pipeline`) - look up or create the customer
//! 2. **Context assembly** (`context`) - recent turns reshaped oldest-first
//! 3. **Response generation** (`responder`) - hosted model behind a fixed
//!    fallback ladder, degrading to a canned reply when every model fails
//! 4. **Persistence** (`pipeline`) - the turn is appended unconditionally
//!
//! # Key Types
//!
//! - `ConversationPipeline` - the orchestrator handlers call
//! - `CompletionClient` - pluggable seam over the hosted completion API
//! - `ResponseGenerator` - the fallback ladder and prompt construction
//!
//! # Safety Principle
//!
//! The hosted model only writes prose. Intent classification and the
//! human-handoff decision are deterministic keyword rules evaluated on the
//! customer's original message, never on model output.

pub mod context;
pub mod llm;
pub mod pipeline;
pub mod responder;

pub use context::CustomerContext;
pub use llm::{ChatMessage, CompletionClient, CompletionError, HostedCompletionClient};
pub use pipeline::{ConversationPipeline, PipelineError, ProcessedMessage};
pub use responder::{GeneratedReply, ResponseGenerator};
