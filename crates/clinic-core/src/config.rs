use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8089;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000; // competing writers wait this long for the lock

/// Top-level config (clinic.toml + CLINIC_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// How long a writer waits on a locked database before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.clinic/clinic.db", home)
}

impl ClinicConfig {
    /// Load config from a TOML file with CLINIC_* env var overrides.
    ///
    /// Nested keys are separated by a double underscore, e.g.
    /// `CLINIC_GATEWAY__PORT=9000` or `CLINIC_DATABASE__PATH=/tmp/c.db`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ClinicConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CLINIC_").split("__"))
            .extract()
            .map_err(|e| crate::error::ClinicError::Config(e.to_string()))?;

        tracing::debug!(path = %path, "configuration loaded");
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.clinic/clinic.toml", home)
}
