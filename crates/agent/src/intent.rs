use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{LlmClient, LlmError};

/// Closed set of categories a customer question is routed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Order,
    Logistics,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Logistics => "LOGISTICS",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Lenient parse of a free-text generation reply. `ORDER` is tested
    /// before `LOGISTICS`, so a reply carrying both resolves to `Order`.
    pub fn from_reply(reply: &str) -> Self {
        let normalized = reply.trim().to_uppercase();
        if normalized.contains("ORDER") {
            Self::Order
        } else if normalized.contains("LOGISTICS") {
            Self::Logistics
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation failed during classification. `fallback` is the category the
/// caller should act on anyway.
#[derive(Debug, Error)]
#[error("intent classification failed: {source}")]
pub struct ClassificationError {
    pub fallback: Intent,
    #[source]
    pub source: LlmError,
}

pub fn classification_prompt(question: &str, history: &str) -> String {
    format!(
        "You are the intent recognition system for a fast-fashion e-commerce customer service desk.

Conversation history:
{history}

Current question: {question}

Analyse the customer's intent and reply with exactly one of:
- ORDER (order related: order status, changes, cancellation, payment)
- LOGISTICS (logistics related: delivery, address, receipt of parcels)
- UNKNOWN (cannot be recognised, or anything else)

Examples:
\"where is my order\" -> ORDER
\"when will it ship\" -> ORDER
\"I want to change my address\" -> LOGISTICS
\"the parcel says delivered but I never got it\" -> LOGISTICS

Reply with only ORDER, LOGISTICS or UNKNOWN and nothing else."
    )
}

#[derive(Clone)]
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Invokes generation once, without retries.
    pub async fn recognize(
        &self,
        question: &str,
        history: &str,
    ) -> Result<Intent, ClassificationError> {
        let prompt = classification_prompt(question, history);
        match self.llm.complete(&prompt).await {
            Ok(reply) => {
                let intent = Intent::from_reply(&reply);
                info!(
                    event_name = "agent.intent.classified",
                    intent = %intent,
                    "intent classified"
                );
                Ok(intent)
            }
            Err(source) => {
                warn!(
                    event_name = "agent.intent.failed",
                    error = %source,
                    "intent classification failed, falling back to UNKNOWN"
                );
                Err(ClassificationError { fallback: Intent::Unknown, source })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::{LlmClient, LlmError};

    /// Replays queued replies in order and records every prompt it receives.
    #[derive(Default)]
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        pub fn replying(replies: &[&str]) -> Self {
            let llm = Self::default();
            for reply in replies {
                llm.push(Ok((*reply).to_string()));
            }
            llm
        }

        pub fn failing() -> Self {
            let llm = Self::default();
            llm.push(Err(LlmError::Timeout(60)));
            llm
        }

        pub fn push(&self, reply: Result<String, LlmError>) {
            self.replies.lock().expect("replies lock").push_back(reply);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompts lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().expect("prompts lock").push(prompt.to_string());
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("no scripted reply left".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::ScriptedLlm;
    use super::{classification_prompt, Intent, IntentClassifier};

    #[test]
    fn reply_normalization_is_lenient_and_order_first() {
        for reply in ["order", "Order ", " ORDER\n", "the answer is ORDER"] {
            assert_eq!(Intent::from_reply(reply), Intent::Order, "reply {reply:?}");
        }
        assert_eq!(Intent::from_reply("LOGISTICS"), Intent::Logistics);
        assert_eq!(Intent::from_reply("ORDER and LOGISTICS"), Intent::Order);
        assert_eq!(Intent::from_reply("maybe"), Intent::Unknown);
        assert_eq!(Intent::from_reply(""), Intent::Unknown);
    }

    #[test]
    fn intent_serializes_as_uppercase_token() {
        assert_eq!(serde_json::to_string(&Intent::Logistics).expect("json"), "\"LOGISTICS\"");
        assert_eq!(Intent::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn prompt_embeds_history_question_and_examples() {
        let prompt = classification_prompt("where is my parcel", "customer: hi");

        assert!(prompt.contains("Conversation history:\ncustomer: hi"));
        assert!(prompt.contains("Current question: where is my parcel"));
        assert!(prompt.contains("\"where is my order\" -> ORDER"));
        assert!(prompt.contains("\"I want to change my address\" -> LOGISTICS"));
        assert!(prompt.contains("Reply with only ORDER, LOGISTICS or UNKNOWN"));
    }

    #[tokio::test]
    async fn recognize_calls_generation_once() {
        let llm = Arc::new(ScriptedLlm::replying(&["  logistics\n"]));
        let classifier = IntentClassifier::new(llm.clone());

        let intent = classifier.recognize("my parcel is late", "").await.expect("intent");

        assert_eq!(intent, Intent::Logistics);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_unknown() {
        let llm = Arc::new(ScriptedLlm::failing());
        let classifier = IntentClassifier::new(llm.clone());

        let error = classifier.recognize("hello", "").await.expect_err("failure");

        assert_eq!(error.fallback, Intent::Unknown);
        assert_eq!(llm.calls(), 1);
    }
}
