//! Keyword-rule intent classification.
//!
//! The rule table is a literal ordered list, evaluated top to bottom with
//! first match winning. The declared order and keyword sets are a hard
//! contract: stored `intent` labels were produced by exactly this table, so
//! reordering or rewording a set would silently reclassify history.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OrderStatus,
    ProductInfo,
    Shipping,
    Returns,
    GeneralHelp,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderStatus => "order_status",
            Self::ProductInfo => "product_info",
            Self::Shipping => "shipping",
            Self::Returns => "returns",
            Self::GeneralHelp => "general_help",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "order_status" => Some(Self::OrderStatus),
            "product_info" => Some(Self::ProductInfo),
            "shipping" => Some(Self::Shipping),
            "returns" => Some(Self::Returns),
            "general_help" => Some(Self::GeneralHelp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered rule table. Evaluation order is significant: a message matching
/// several sets takes the earliest one (e.g. "return" beats "help").
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::OrderStatus,
        &["order status", "where is my order", "tracking", "when will it arrive", "order number"],
    ),
    (Intent::ProductInfo, &["product", "in stock", "available", "price", "size", "color"]),
    (Intent::Shipping, &["shipping", "delivery", "ship", "arrive"]),
    (Intent::Returns, &["return", "exchange", "refund", "send back"]),
    (Intent::GeneralHelp, &["help", "hello", "hi", "support", "question"]),
];

/// Classify a raw user message by substring containment against the rule
/// table. Messages matching no set default to `general_help`.
pub fn classify_intent(message: &str) -> Intent {
    let message_lower = message.to_lowercase();

    for (intent, keywords) in INTENT_RULES {
        if keywords.iter().any(|keyword| message_lower.contains(keyword)) {
            return *intent;
        }
    }

    Intent::GeneralHelp
}

/// Suggested next steps for a human agent, keyed by intent label. Labels not
/// produced by the classifier map to a single generic action.
pub fn suggested_actions(intent: &str) -> &'static [&'static str] {
    match intent {
        "order_status" => &[
            "Ask for order number",
            "Check email for order confirmation",
            "Provide tracking information",
        ],
        "product_info" => &["Share product link", "Check inventory", "Suggest similar products"],
        "shipping" => &[
            "Provide shipping timeline",
            "Check carrier information",
            "Update delivery status",
        ],
        "returns" => &[
            "Escalate to returns specialist",
            "Provide return instructions",
            "Process refund",
        ],
        "general_help" => &[
            "Offer assistance",
            "Provide contact information",
            "Suggest help resources",
        ],
        _ => &["Continue conversation"],
    }
}
