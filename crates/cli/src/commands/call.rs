use std::sync::Arc;

use fashiondesk_agent::tools::{ToolArgs, ToolOutcome, ToolRegistry, UPDATE_ORDER_ADDRESS};
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;

use crate::commands::{exit, load_config, runtime, CommandResult};

pub fn run(tool: &str, raw_args: &[String]) -> CommandResult {
    let args = match parse_args(raw_args) {
        Ok(args) => args,
        Err(message) => {
            return CommandResult::failure("call", "invalid_argument", message, exit::USAGE)
        }
    };
    let config = match load_config("call") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    if tool == UPDATE_ORDER_ADDRESS && config.store.snapshot_path.is_none() {
        return CommandResult::failure(
            "call",
            "missing_snapshot_path",
            "address updates need store.snapshot_path; without it the change would be lost on exit",
            exit::USAGE,
        );
    }
    let sops = match SopRegistry::from_config(&config.sop) {
        Ok(sops) => Arc::new(sops),
        Err(error) => {
            return CommandResult::failure("call", "sop_registry", error.to_string(), exit::CONFIG)
        }
    };
    let runtime = match runtime("call") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let store = match OrderStore::from_config(&config.store).await {
            Ok(store) => Arc::new(store),
            Err(error) => {
                return CommandResult::failure("call", "store_open", error.to_string(), exit::STORE)
            }
        };
        let registry = ToolRegistry::standard(Arc::clone(&store), sops);

        let outcome = registry.invoke(tool, &args).await;
        if let ToolOutcome::Error(message) = &outcome {
            return CommandResult::failure("call", "tool_error", message.as_str(), exit::TOOL);
        }

        if tool == UPDATE_ORDER_ADDRESS {
            if let Some(path) = config.store.snapshot_path.as_deref() {
                if let Err(error) = store.save_snapshot(path).await {
                    let message = error.to_string();
                    return CommandResult::failure("call", "snapshot_write", message, exit::STORE);
                }
            }
        }

        CommandResult::success("call", outcome.render())
    })
}

fn parse_args(raw_args: &[String]) -> Result<ToolArgs, String> {
    raw_args
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("expected KEY=VALUE, got `{pair}`")),
        })
        .collect()
}
