use std::sync::Arc;

use fashiondesk_core::sop::{SopKind, SopRegistry};
use tracing::info;

use crate::llm::{LlmClient, LlmError};

pub const ORDER_NOT_FOUND_REPLY: &str =
    "Sorry, we couldn't find that order. Please provide a valid order number.";

pub fn order_prompt(sop: &str, history: &str, order_info: &str, question: &str) -> String {
    format!(
        "You are an AI customer service assistant for a fast-fashion e-commerce store, \
         handling order questions.

Follow this decision tree strictly:

{sop}

Conversation history:
{history}

Order information:
{order_info}

Customer question: {question}

Reply rules:
1. Follow the decision tree strictly.
2. Keep the answer short and clear.
3. Use a friendly, professional tone.
4. Do not add a formal sign-off.
5. Answer the customer's question directly with a clear answer or next step.
6. If you need more information from the customer, ask for it politely.

Now reply to the customer's question using the information above."
    )
}

/// Answers order questions from the order SOP and a formatted order record.
#[derive(Clone)]
pub struct OrderHandler {
    llm: Arc<dyn LlmClient>,
    sops: Arc<SopRegistry>,
}

impl OrderHandler {
    pub fn new(llm: Arc<dyn LlmClient>, sops: Arc<SopRegistry>) -> Self {
        Self { llm, sops }
    }

    /// Returns the generated reply verbatim. An empty `order_info` short-circuits
    /// to [`ORDER_NOT_FOUND_REPLY`] without calling generation.
    pub async fn handle(
        &self,
        question: &str,
        history: &str,
        order_info: &str,
    ) -> Result<String, LlmError> {
        if order_info.trim().is_empty() {
            info!(
                event_name = "agent.order.no_record",
                "no order record, asking for an order number"
            );
            return Ok(ORDER_NOT_FOUND_REPLY.to_string());
        }

        let prompt = order_prompt(self.sops.get(SopKind::Order), history, order_info, question);
        self.llm.complete(&prompt).await
    }
}
