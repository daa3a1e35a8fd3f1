use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7070".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrokerConfig {
    /// Advisory per-topic retention limit applied when a create-topic
    /// request does not specify one.
    pub default_retention_messages: u32,
    pub ack_timeout_secs: u64,
    pub max_message_size_bytes: usize,
    /// Batch size used when a consume request does not specify one.
    pub default_consume_batch: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_retention_messages: 10_000,
            ack_timeout_secs: 30,
            max_message_size_bytes: 1_048_576,
            default_consume_batch: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

/// Loads configuration from a TOML file. A missing file is not an error:
/// the built-in defaults apply.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw: String = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}
