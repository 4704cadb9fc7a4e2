use std::env;
use std::fs;
use std::path::Path;

use fashiondesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn field(key_path: &'static str, env_keys: &'static [&'static str], value: String) -> ConfigField {
    ConfigField { key_path, env_keys, value }
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        field(
            "llm.base_url",
            &["FASHIONDESK_LLM_BASE_URL", "OLLAMA_BASE_URL"],
            config.llm.base_url.clone(),
        ),
        field("llm.model", &["FASHIONDESK_LLM_MODEL", "OLLAMA_MODEL"], config.llm.model.clone()),
        field(
            "llm.timeout_secs",
            &["FASHIONDESK_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        field(
            "llm.api_key",
            &["FASHIONDESK_LLM_API_KEY"],
            if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" }.to_string(),
        ),
        field(
            "server.bind_address",
            &["FASHIONDESK_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        field(
            "server.port",
            &["FASHIONDESK_SERVER_PORT", "SERVER_PORT"],
            config.server.port.to_string(),
        ),
        field(
            "store.snapshot_path",
            &["FASHIONDESK_STORE_SNAPSHOT_PATH"],
            display_path(config.store.snapshot_path.as_deref()),
        ),
        field(
            "store.save_on_shutdown",
            &["FASHIONDESK_STORE_SAVE_ON_SHUTDOWN"],
            config.store.save_on_shutdown.to_string(),
        ),
        field(
            "sop.order_path",
            &["FASHIONDESK_SOP_ORDER_PATH"],
            display_path(config.sop.order_path.as_deref()),
        ),
        field(
            "sop.logistics_path",
            &["FASHIONDESK_SOP_LOGISTICS_PATH"],
            display_path(config.sop.logistics_path.as_deref()),
        ),
        field(
            "agent.default_order_id",
            &["FASHIONDESK_AGENT_DEFAULT_ORDER_ID"],
            config.agent.default_order_id.clone(),
        ),
        field(
            "logging.level",
            &["FASHIONDESK_LOGGING_LEVEL", "FASHIONDESK_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["FASHIONDESK_LOGGING_FORMAT", "FASHIONDESK_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<builtin>".to_string())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys.iter().find(|key| {
        env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn nested_keys_are_found_in_config_documents() {
        let doc = "[llm]\nmodel = \"qwen3:14b\"\n[store]\nsave_on_shutdown = true\n"
            .parse::<Value>()
            .expect("toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(contains_path(&doc, "store.save_on_shutdown"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
