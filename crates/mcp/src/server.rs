//! MCP server implementation over the tool gateway.

use std::sync::Arc;

use fashiondesk_agent::tools::{ToolArgs, ToolOutcome, ToolRegistry};
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    RoleServer, ServerHandler, ServiceExt,
};
use tracing::{debug, info};

pub const SERVER_NAME: &str = "fashiondesk-customer-service";

/// MCP server publishing every tool of a [`ToolRegistry`].
#[derive(Clone)]
pub struct FashionDeskMcpServer {
    store: Arc<OrderStore>,
    tools: Arc<ToolRegistry>,
}

impl FashionDeskMcpServer {
    pub fn new(store: Arc<OrderStore>, sops: Arc<SopRegistry>) -> Self {
        let tools = Arc::new(ToolRegistry::standard(Arc::clone(&store), sops));
        Self { store, tools }
    }

    pub fn store(&self) -> &Arc<OrderStore> {
        &self.store
    }

    /// Tool descriptors in registry order.
    pub fn tool_descriptors(&self) -> Vec<Tool> {
        self.tools
            .specs()
            .into_iter()
            .map(|spec| Tool::new(spec.name, spec.description, Arc::new(spec.input_schema())))
            .collect()
    }

    /// Runs one tool call. Unknown tool names are protocol errors; argument
    /// and lookup failures come back as error results.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        if !self.tools.contains(name) {
            return Err(ErrorData::invalid_params(format!("unknown tool `{name}`"), None));
        }
        debug!(tool = name, "MCP tool call");

        let args = match ToolArgs::from_json(&arguments.unwrap_or_default()) {
            Ok(args) => args,
            Err(error) => {
                return Ok(CallToolResult::error(vec![Content::text(error.to_string())]));
            }
        };

        let outcome = self.tools.invoke(name, &args).await;
        let content = vec![Content::text(outcome.render())];
        Ok(match outcome {
            ToolOutcome::Error(_) => CallToolResult::error(content),
            ToolOutcome::Structured(_) | ToolOutcome::Text(_) => CallToolResult::success(content),
        })
    }

    /// Serves MCP over stdin/stdout until the client disconnects.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(
            event_name = "mcp.server.start",
            tools = self.tools.len(),
            "starting MCP server on stdio"
        );

        let service = self.serve(rmcp::transport::stdio()).await?;
        let reason = service.waiting().await?;

        info!(
            event_name = "mcp.server.stop",
            reason = ?reason,
            "MCP server shutdown complete"
        );
        Ok(())
    }
}

impl ServerHandler for FashionDeskMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "FashionDesk customer service tools. Look up orders, change a shipping \
                 address, and read the order or logistics SOP decision tree."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_descriptors()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.invoke(&request.name, request.arguments).await
    }
}
