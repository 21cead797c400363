use crate::core::price::Currency;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    #[serde(default = "default_coin_id")]
    pub coin_id: String,
    /// Demo API key, sent as `x-cg-demo-api-key` when present.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_coin_id() -> String {
    "kaspa".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KaspaProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub kaspa: Option<KaspaProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                coin_id: default_coin_id(),
                api_key: None,
            }),
            kaspa: Some(KaspaProviderConfig {
                base_url: "https://api.kaspa.org".to_string(),
            }),
        }
    }
}

/// Offline price backup used for dates the free-tier API no longer
/// serves. A CSV with `date` and `price` columns.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    pub path: String,
}

fn default_window_days() -> u32 {
    365
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Wallet address to track, `kaspa:` prefixed.
    pub address: String,
    pub currency: Currency,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Trailing days of history the free CoinGecko tier serves.
    #[serde(default = "default_window_days")]
    pub history_window_days: u32,
    #[serde(default)]
    pub import: Option<ImportConfig>,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "kastrack", "kastrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "kastrack", "kastrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
