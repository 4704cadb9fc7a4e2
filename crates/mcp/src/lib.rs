//! FashionDesk MCP (Model Context Protocol) server
//!
//! Exposes the order and SOP tool gateway to external automation clients.
//! Tools are listed straight from the agent's `ToolRegistry`, so an MCP
//! client sees the same names, descriptions and argument schemas the
//! in-process order handler uses.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fashiondesk_core::sop::SopRegistry;
//! use fashiondesk_db::OrderStore;
//! use fashiondesk_mcp::FashionDeskMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = FashionDeskMcpServer::new(
//!         Arc::new(OrderStore::seeded()),
//!         Arc::new(SopRegistry::builtin()),
//!     );
//!     server.run_stdio().await
//! }
//! ```

mod server;

pub use server::{FashionDeskMcpServer, SERVER_NAME};
