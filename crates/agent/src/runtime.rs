use std::sync::Arc;

use fashiondesk_core::domain::order::{OrderId, OrderRecord};
use fashiondesk_core::sop::SopRegistry;
use thiserror::Error;
use tracing::{info, warn};

use crate::intent::{ClassificationError, Intent, IntentClassifier};
use crate::llm::{LlmClient, LlmError};
use crate::order::OrderHandler;
use crate::tools::{ToolArgs, ToolOutcome, ToolRegistry, GET_ORDER_INFO};

pub const SAMPLE_QUESTION: &str = "Where is my order? The order number is 123";

pub const LOGISTICS_REPLY: &str = "For delivery questions, please contact our support team \
    and they will help with shipping and delivery.";
pub const CLARIFICATION_REPLY: &str =
    "Sorry, I didn't quite understand. Is your question about an order or about delivery?";
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Supplies the order a question refers to. Free-text extraction is not
/// attempted; implementations decide from whatever context they hold.
pub trait OrderIdResolver: Send + Sync {
    fn resolve(&self, question: &str, history: &str) -> Option<OrderId>;
}

/// Always resolves to the configured order id.
#[derive(Clone, Debug)]
pub struct ConfiguredOrderId(OrderId);

impl ConfiguredOrderId {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self(order_id.into())
    }
}

impl OrderIdResolver for ConfiguredOrderId {
    fn resolve(&self, _question: &str, _history: &str) -> Option<OrderId> {
        Some(self.0.clone())
    }
}

#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error("intent classification failed: {0}")]
    Classification(#[source] LlmError),
    #[error("order handler failed: {0}")]
    OrderHandler(#[source] LlmError),
}

impl DispatchFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Classification(_) => "classification_failed",
            Self::OrderHandler(_) => "order_handler_failed",
        }
    }
}

/// Outcome of one message. `response` is always safe to show the customer;
/// `failure` carries the internal cause when generation failed.
#[derive(Debug)]
pub struct ChatReply {
    pub intent: Intent,
    pub response: String,
    pub failure: Option<DispatchFailure>,
}

impl ChatReply {
    fn answered(intent: Intent, response: impl Into<String>) -> Self {
        Self { intent, response: response.into(), failure: None }
    }
}

pub struct AgentRuntime {
    classifier: IntentClassifier,
    order_handler: OrderHandler,
    tools: Arc<ToolRegistry>,
    resolver: Box<dyn OrderIdResolver>,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        sops: Arc<SopRegistry>,
        tools: Arc<ToolRegistry>,
        resolver: impl OrderIdResolver + 'static,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(Arc::clone(&llm)),
            order_handler: OrderHandler::new(llm, sops),
            tools,
            resolver: Box::new(resolver),
        }
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub async fn check_intent(&self, question: &str) -> Result<Intent, ClassificationError> {
        self.classifier.recognize(question, "").await
    }

    /// Classifies the message and answers it. Never fails: generation
    /// problems come back as a friendly `response` plus `failure`.
    pub async fn handle_message(&self, message: &str, history: &str) -> ChatReply {
        let intent = match self.classifier.recognize(message, history).await {
            Ok(intent) => intent,
            Err(error) => {
                return ChatReply {
                    intent: error.fallback,
                    response: CLARIFICATION_REPLY.to_string(),
                    failure: Some(DispatchFailure::Classification(error.source)),
                };
            }
        };

        match intent {
            Intent::Order => self.answer_order(message, history).await,
            Intent::Logistics => ChatReply::answered(intent, LOGISTICS_REPLY),
            Intent::Unknown => ChatReply::answered(intent, CLARIFICATION_REPLY),
        }
    }

    async fn answer_order(&self, message: &str, history: &str) -> ChatReply {
        let order_info = self.order_info(message, history).await;
        match self.order_handler.handle(message, history, &order_info).await {
            Ok(response) => ChatReply::answered(Intent::Order, response),
            Err(error) => {
                warn!(
                    event_name = "agent.order.failed",
                    error = %error,
                    "order handler failed"
                );
                ChatReply {
                    intent: Intent::Order,
                    response: FALLBACK_REPLY.to_string(),
                    failure: Some(DispatchFailure::OrderHandler(error)),
                }
            }
        }
    }

    /// Formatted record text for the resolved order, or empty when there is
    /// no order to show.
    async fn order_info(&self, message: &str, history: &str) -> String {
        let Some(order_id) = self.resolver.resolve(message, history) else {
            return String::new();
        };

        let args = ToolArgs::new().with("order_id", order_id.as_str());
        match self.tools.invoke(GET_ORDER_INFO, &args).await {
            ToolOutcome::Structured(value) => match serde_json::from_value::<OrderRecord>(value) {
                Ok(record) => {
                    info!(event_name = "agent.order.resolved", order_id = %order_id, "order found");
                    record.to_string()
                }
                Err(error) => {
                    warn!(
                        event_name = "agent.order.decode_failed",
                        order_id = %order_id,
                        error = %error,
                        "order payload could not be decoded"
                    );
                    String::new()
                }
            },
            _ => String::new(),
        }
    }
}
