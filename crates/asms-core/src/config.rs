//! Per-component configuration structs, TOML-loaded. One struct per
//! concern, `serde`-deserialized with `#[serde(default)]` for every
//! field that has a sane default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub default_timeout_ms: u64,
    pub max_body_bytes: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub stdio_enabled: bool,
    pub sse_bind_addr: String,
    pub sse_queue_capacity: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            stdio_enabled: true,
            sse_bind_addr: "127.0.0.1:7800".to_string(),
            sse_queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub ttl_secs: u64,
    pub reap_interval_secs: u64,
    pub max_messages: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 2 * 60 * 60,
            reap_interval_secs: 15 * 60,
            max_messages: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub enabled: bool,
    pub max_tool_call_rounds: u32,
    pub provider: String,
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tool_call_rounds: 10,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7700".to_string(),
        }
    }
}

/// Root configuration structure: one field per component, each with
/// its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AsmsConfig {
    pub http: HttpConfig,
    pub gateway: GatewayConfig,
    pub mcp: McpConfig,
    pub conversation: ConversationConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load an `AsmsConfig` from a TOML file. A thin wrapper, not a
/// validating parser — field-level defaults live on the config structs
/// themselves via `#[serde(default)]`.
pub fn load_config(path: &std::path::Path) -> Result<AsmsConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AsmsConfig = toml::from_str(&text)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = AsmsConfig::default();
        assert_eq!(config.gateway.default_timeout_ms, 30_000);
        assert_eq!(config.conversation.ttl_secs, 2 * 60 * 60);
        assert_eq!(config.conversation.max_messages, 100);
        assert_eq!(config.agent.max_tool_call_rounds, 10);
        assert_eq!(config.gateway.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asms.toml");
        std::fs::write(&path, "[gateway]\ndefault_timeout_ms = 5000\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.default_timeout_ms, 5000);
        assert_eq!(config.conversation.ttl_secs, 2 * 60 * 60);
    }
}
