use crate::core::money;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Packaging material consumed by every sold item.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SuppliesConfig {
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub units_per_item: f64,
}

impl SuppliesConfig {
    pub fn cost_per_item(&self) -> f64 {
        money::supply_cost_per_item(self.cost_per_unit, self.units_per_item)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RatesProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncProviderConfig {
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub rates: Option<RatesProviderConfig>,
    pub extraction: Option<ExtractionProviderConfig>,
    pub sync: Option<SyncProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            rates: Some(RatesProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            extraction: Some(ExtractionProviderConfig {
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.0-flash".to_string(),
                api_key_env: default_api_key_env(),
            }),
            sync: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Local (bookkeeping) currency.
    pub currency: String,
    /// Currency batches are usually bought in.
    pub foreign_currency: Option<String>,
    /// Default foreign-to-local rate for new batches.
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub supplies: SuppliesConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "shopkeep", "shopkeep")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "shopkeep", "shopkeep")
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
