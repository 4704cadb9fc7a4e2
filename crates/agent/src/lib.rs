//! Agent runtime: intent routing and tool invocation for customer questions.
//!
//! A message flows through a constrained loop:
//! 1. **Intent classification** (`intent`) - one generation call maps the
//!    question and history to `ORDER`, `LOGISTICS` or `UNKNOWN`.
//! 2. **Dispatch** (`runtime`) - the category picks a handler or a fixed reply.
//! 3. **Tool invocation** (`tools`) - handlers read and mutate order records and
//!    SOP text through the named-operation gateway shared with MCP clients.
//! 4. **Reply generation** (`order`) - the order handler composes the SOP,
//!    history, record and question into a single prompt.
//!
//! # Key Types
//!
//! - `AgentRuntime` - the dispatcher (see `runtime`)
//! - `LlmClient` - the generation capability, with `OllamaClient` as the shipped backend
//! - `ToolRegistry` - the self-describing tool gateway
//!
//! No store lock is ever held across a generation call: the gateway hands out
//! owned payloads and generation only sees formatted text.

pub mod intent;
pub mod llm;
pub mod order;
pub mod runtime;
pub mod tools;
