// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub crypto: CryptoConfig,

    #[serde(default)]
    pub oauth: OAuthConfigSection,

    /// Bearer-token → organisation mapping. Stands in for the out-of-scope
    /// authentication layer: a request carrying one of these tokens is
    /// treated as authenticated for the named organisation.
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 7431,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "toolgate.db".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// 32-byte AES-256-GCM master key, hex-encoded (64 hex chars).
    pub master_key: Option<String>,
}

impl CryptoConfig {
    /// Decode the configured master key. Errors when absent or malformed —
    /// there is deliberately no development fallback key.
    pub fn master_key_bytes(&self) -> anyhow::Result<[u8; 32]> {
        let hex_key = self
            .master_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("crypto.master_key is not configured"))?;
        let bytes = hex::decode(hex_key.trim())
            .map_err(|_| anyhow::anyhow!("crypto.master_key is not valid hex"))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("crypto.master_key must decode to 32 bytes"))?;
        Ok(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfigSection {
    /// Timeout for outbound token-refresh calls, in seconds. A slow
    /// identity provider must not stall the dispatch path.
    pub refresh_timeout_secs: u64,
}

impl Default for OAuthConfigSection {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<OrgToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgToken {
    pub token: String,
    pub organisation_id: Uuid,
}

impl Config {
    /// Load from an explicit path. Errors if the file is missing or invalid.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the given path when present, defaults otherwise.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }
}
