//! Named-operation gateway over the order store and SOP registry.
//!
//! Every tool declares its argument schema up front. The registry validates
//! arguments against that schema before a tool runs, so a tool only ever sees
//! the required arguments present and non-blank. Absent records are not
//! errors at this layer: tools answer with a typed failure payload.

mod order;
mod sop;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub use order::{GetOrderInfoTool, UpdateOrderAddressTool};
pub use sop::GetSopTreeTool;

pub const GET_ORDER_INFO: &str = "get_order_info";
pub const UPDATE_ORDER_ADDRESS: &str = "update_order_address";
pub const GET_SOP_TREE: &str = "get_sop_tree";

pub const ORDER_NOT_FOUND: &str = "order not found";
pub const ADDRESS_UPDATE_FAILED: &str = "address update failed";
pub const INVALID_SOP_TYPE: &str = "invalid sop type";
pub const ADDRESS_UPDATED: &str = "address updated";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArgSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub arg_type: &'static str,
    pub required: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<&'static [&'static str]>,
}

impl ArgSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, arg_type: "string", required: true, description, allowed_values: None }
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgSpec>,
}

impl ToolSpec {
    /// JSON Schema object describing the tool's arguments.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for arg in &self.args {
            let mut property = Map::new();
            property.insert("type".to_string(), Value::from(arg.arg_type));
            property.insert("description".to_string(), Value::from(arg.description));
            if let Some(values) = arg.allowed_values {
                property.insert("enum".to_string(), Value::from(values.to_vec()));
            }
            properties.insert(arg.name.to_string(), Value::Object(property));
            if arg.required {
                required.push(Value::from(arg.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        schema
    }
}

/// String arguments keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolArgs(BTreeMap<String, String>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Present and non-blank.
    pub fn require(&self, name: &str) -> Result<&str, ToolError> {
        self.get(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ToolError::MissingArgument(name.to_string()))
    }

    /// Accepts a JSON object whose values are all strings.
    pub fn from_json(arguments: &Map<String, Value>) -> Result<Self, ToolError> {
        arguments
            .iter()
            .map(|(name, value)| match value {
                Value::String(text) => Ok((name.clone(), text.clone())),
                _ => Err(ToolError::InvalidArgument {
                    argument: name.clone(),
                    reason: "must be a string".to_string(),
                }),
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ToolArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}

/// Uniform result envelope shared by every tool.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    Structured(Value),
    Text(String),
    Error(String),
}

impl ToolOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn render(&self) -> String {
        match self {
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) | Self::Error(text) => text.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("missing required argument `{0}`")]
    MissingArgument(String),
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument { argument: String, reason: String },
    #[error("tool execution failed: {0}")]
    Execution(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutcome, ToolError>;
}

struct RegisteredTool {
    spec: ToolSpec,
    tool: Box<dyn Tool>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, RegisteredTool>,
}

impl ToolRegistry {
    /// The fixed operation set over one store and one SOP registry.
    pub fn standard(store: Arc<OrderStore>, sops: Arc<SopRegistry>) -> Self {
        let mut registry = Self::default();
        registry.register(GetOrderInfoTool::new(Arc::clone(&store)));
        registry.register(UpdateOrderAddressTool::new(store));
        registry.register(GetSopTreeTool::new(sops));
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let spec = tool.spec();
        self.tools.insert(spec.name, RegisteredTool { spec, tool: Box::new(tool) });
    }

    /// Specs sorted by tool name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|registered| registered.spec.clone()).collect()
    }

    pub fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name).map(|registered| &registered.spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invokes a tool by name, folding validation failures into
    /// [`ToolOutcome::Error`].
    pub async fn invoke(&self, name: &str, args: &ToolArgs) -> ToolOutcome {
        match self.try_invoke(name, args).await {
            Ok(outcome) => outcome,
            Err(error) => ToolOutcome::Error(error.to_string()),
        }
    }

    pub async fn try_invoke(&self, name: &str, args: &ToolArgs) -> Result<ToolOutcome, ToolError> {
        let registered =
            self.tools.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        validate_args(&registered.spec, args)?;

        let outcome = registered.tool.execute(args).await;
        match &outcome {
            Ok(outcome) if outcome.is_error() => warn!(
                event_name = "agent.tool.failed",
                tool = name,
                failure = %outcome.render(),
                "tool returned a failure payload"
            ),
            Ok(_) => info!(event_name = "agent.tool.invoked", tool = name, "tool invoked"),
            Err(error) => warn!(
                event_name = "agent.tool.error",
                tool = name,
                error = %error,
                "tool execution error"
            ),
        }
        outcome
    }
}

fn validate_args(spec: &ToolSpec, args: &ToolArgs) -> Result<(), ToolError> {
    spec.args
        .iter()
        .filter(|arg| arg.required)
        .try_for_each(|arg| args.require(arg.name).map(drop))
}
