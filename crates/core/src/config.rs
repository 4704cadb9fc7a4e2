use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "fashiondesk.toml";
pub const NESTED_CONFIG_FILE: &str = "config/fashiondesk.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub sop: SopConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    pub snapshot_path: Option<PathBuf>,
    pub save_on_shutdown: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SopConfig {
    pub order_path: Option<PathBuf>,
    pub logistics_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Order looked up for ORDER questions until order-number extraction exists.
    pub default_order_id: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub server_port: Option<u16>,
    pub snapshot_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "qwen3:14b".to_string(),
                timeout_secs: 60,
                api_key: None,
            },
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 8080 },
            store: StoreConfig::default(),
            sop: SopConfig::default(),
            agent: AgentConfig { default_order_id: "123".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Address the HTTP front door listens on.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(store) = patch.store {
            if let Some(snapshot_path) = store.snapshot_path {
                self.store.snapshot_path = Some(snapshot_path);
            }
            if let Some(save_on_shutdown) = store.save_on_shutdown {
                self.store.save_on_shutdown = save_on_shutdown;
            }
        }

        if let Some(sop) = patch.sop {
            if let Some(order_path) = sop.order_path {
                self.sop.order_path = Some(order_path);
            }
            if let Some(logistics_path) = sop.logistics_path {
                self.sop.logistics_path = Some(logistics_path);
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(default_order_id) = agent.default_order_id {
                self.agent.default_order_id = default_order_id;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let base_url = read_env("FASHIONDESK_LLM_BASE_URL").or_else(|| read_env("OLLAMA_BASE_URL"));
        if let Some(value) = base_url {
            self.llm.base_url = value;
        }
        let model = read_env("FASHIONDESK_LLM_MODEL").or_else(|| read_env("OLLAMA_MODEL"));
        if let Some(value) = model {
            self.llm.model = value;
        }
        if let Some(value) = read_env("FASHIONDESK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("FASHIONDESK_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FASHIONDESK_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("FASHIONDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FASHIONDESK_SERVER_PORT") {
            self.server.port = parse_u16("FASHIONDESK_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("SERVER_PORT") {
            self.server.port = parse_u16("SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("FASHIONDESK_STORE_SNAPSHOT_PATH") {
            self.store.snapshot_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("FASHIONDESK_STORE_SAVE_ON_SHUTDOWN") {
            self.store.save_on_shutdown =
                parse_bool("FASHIONDESK_STORE_SAVE_ON_SHUTDOWN", &value)?;
        }

        if let Some(value) = read_env("FASHIONDESK_SOP_ORDER_PATH") {
            self.sop.order_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("FASHIONDESK_SOP_LOGISTICS_PATH") {
            self.sop.logistics_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("FASHIONDESK_AGENT_DEFAULT_ORDER_ID") {
            self.agent.default_order_id = value;
        }

        let log_level =
            read_env("FASHIONDESK_LOGGING_LEVEL").or_else(|| read_env("FASHIONDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FASHIONDESK_LOGGING_FORMAT").or_else(|| read_env("FASHIONDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(snapshot_path) = overrides.snapshot_path {
            self.store.snapshot_path = Some(snapshot_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_agent(&self.agent)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.model is required (for example `qwen3:14b`)".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    let blank_key =
        llm.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(false);
    if blank_key {
        return Err(ConfigError::Validation(
            "llm.api_key must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address is required".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    if agent.default_order_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "agent.default_order_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    store: Option<StorePatch>,
    sop: Option<SopPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    snapshot_path: Option<PathBuf>,
    save_on_shutdown: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SopPatch {
    order_path: Option<PathBuf>,
    logistics_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    default_order_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const CONFIG_VARS: &[&str] = &[
        "FASHIONDESK_LLM_BASE_URL",
        "FASHIONDESK_LLM_MODEL",
        "FASHIONDESK_LLM_TIMEOUT_SECS",
        "FASHIONDESK_LLM_API_KEY",
        "FASHIONDESK_SERVER_PORT",
        "FASHIONDESK_LOG_LEVEL",
        "FASHIONDESK_LOG_FORMAT",
        "OLLAMA_BASE_URL",
        "OLLAMA_MODEL",
        "SERVER_PORT",
        "TEST_FASHIONDESK_API_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_local_ollama_setup() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.llm.base_url == "http://localhost:11434", "default ollama url")?;
        ensure(config.llm.model == "qwen3:14b", "default model")?;
        ensure(config.server.port == 8080, "default port")?;
        ensure(config.agent.default_order_id == "123", "default order id")?;
        ensure(config.store.snapshot_path.is_none(), "no snapshot by default")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("TEST_FASHIONDESK_API_KEY", "proxy-secret");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("fashiondesk.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_FASHIONDESK_API_KEY}"
model = "llama3.1"

[store]
snapshot_path = "data/orders.json"
save_on_shutdown = true
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "proxy-secret")
                    == Some(true),
                "api key should be interpolated from environment",
            )?;
            ensure(config.llm.model == "llama3.1", "model should come from file")?;
            ensure(
                config.store.snapshot_path == Some(PathBuf::from("data/orders.json")),
                "snapshot path should come from file",
            )?;
            ensure(config.store.save_on_shutdown, "save_on_shutdown should come from file")
        })();

        clear_vars(CONFIG_VARS);
        result
    }

    #[test]
    fn original_env_names_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("OLLAMA_BASE_URL", "http://ollama.internal:11434");
        env::set_var("OLLAMA_MODEL", "qwen3:8b");
        env::set_var("SERVER_PORT", "9090");
        env::set_var("FASHIONDESK_LOG_LEVEL", "warn");
        env::set_var("FASHIONDESK_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.base_url == "http://ollama.internal:11434", "OLLAMA_BASE_URL")?;
            ensure(config.llm.model == "qwen3:8b", "OLLAMA_MODEL")?;
            ensure(config.server.port == 9090, "SERVER_PORT")?;
            ensure(config.logging.level == "warn", "log level alias")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "log format alias")
        })();

        clear_vars(CONFIG_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("FASHIONDESK_LLM_MODEL", "from-env");
        env::set_var("FASHIONDESK_SERVER_PORT", "7000");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("fashiondesk.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "from-file"
base_url = "http://from-file:11434"

[server]
port = 6000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    server_port: Some(5000),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.base_url == "http://from-file:11434", "file should beat default")?;
            ensure(config.llm.model == "from-env", "env should beat file")?;
            ensure(config.server.port == 5000, "override should beat env")?;
            ensure(config.logging.level == "debug", "override log level should win")
        })();

        clear_vars(CONFIG_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("FASHIONDESK_LLM_BASE_URL", "localhost:11434");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.base_url")
            );
            ensure(has_message, "validation failure should mention llm.base_url")
        })();

        clear_vars(CONFIG_VARS);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("FASHIONDESK_LLM_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { ref key, .. })
                if key == "FASHIONDESK_LLM_TIMEOUT_SECS" =>
            {
                Ok(())
            }
            other => Err(format!("unexpected load result: {other:?}")),
        };

        clear_vars(CONFIG_VARS);
        result
    }

    #[test]
    fn required_file_is_enforced() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/fashiondesk.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(CONFIG_VARS);
        env::set_var("FASHIONDESK_LLM_API_KEY", "very-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("very-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(CONFIG_VARS);
        result
    }
}
