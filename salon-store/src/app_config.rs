use salon_shared::Masked;
use serde::Deserialize;
use std::env;

/// Longest accepted `checkout.expiry_seconds`, ten years
pub const MAX_EXPIRY_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub backend: BackendConfig,
    pub checkout: CheckoutRules,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub redis_url: Option<String>,
    /// Single key holding the whole pending collection
    pub namespace_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            redis_url: None,
            namespace_key: "pending_reservations".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_token: Option<Masked<String>>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CheckoutRules {
    pub expiry_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub event_buffer: usize,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        Self {
            expiry_seconds: 3600,
            sweep_interval_seconds: 60,
            event_buffer: 100,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layered load: `<dir>/default`, `<dir>/<RUN_MODE>`, `<dir>/local`, then
    /// `SALON__`-style environment variables. Every layer is optional.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // e.g. `SALON_STORAGE__KIND=redis`
            .add_source(config::Environment::with_prefix("SALON").separator("__"))
            .build()?;

        s.try_deserialize::<Self>()?.validated()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    fn validated(self) -> Result<Self, config::ConfigError> {
        if self.checkout.expiry_seconds > MAX_EXPIRY_SECONDS {
            return Err(config::ConfigError::Message(format!(
                "checkout.expiry_seconds = {} exceeds the maximum of {}",
                self.checkout.expiry_seconds, MAX_EXPIRY_SECONDS
            )));
        }
        Ok(self)
    }
}
