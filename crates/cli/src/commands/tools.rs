use std::sync::Arc;

use fashiondesk_agent::tools::{ToolRegistry, ToolSpec};
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;
use serde_json::{json, Value};

/// Lists the standard tool set. Specs do not depend on store contents, so the
/// registry is built over the seed orders and builtin SOPs.
pub fn run(json_output: bool) -> String {
    let registry =
        ToolRegistry::standard(Arc::new(OrderStore::seeded()), Arc::new(SopRegistry::builtin()));
    let specs = registry.specs();

    if json_output {
        let listing = specs.iter().map(describe).collect::<Vec<_>>();
        return serde_json::to_string_pretty(&listing)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
    }

    render_human(&specs)
}

fn describe(spec: &ToolSpec) -> Value {
    json!({
        "name": spec.name,
        "description": spec.description,
        "input_schema": spec.input_schema(),
    })
}

fn render_human(specs: &[ToolSpec]) -> String {
    let mut lines = Vec::new();
    for spec in specs {
        lines.push(format!("{}: {}", spec.name, spec.description));
        for arg in &spec.args {
            let allowed = arg
                .allowed_values
                .map(|values| format!(" [{}]", values.join("|")))
                .unwrap_or_default();
            let required = if arg.required { "required" } else { "optional" };
            lines.push(format!("  - {} ({required}){allowed}: {}", arg.name, arg.description));
        }
    }
    lines.join("\n")
}
