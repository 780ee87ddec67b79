//! Pool Configuration Module
//!
//! Provides configuration loading for StableSwap pools.
//! Supports loading from TOML files with environment-specific overrides.

use crate::constants::{amplification, fees, pool};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/stablepool.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "STABLEPOOL";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AmmConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pools to create at startup
    #[serde(default)]
    pub pools: Vec<PoolSettings>,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Settings for a single pool
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub id: String,
    pub assets: Vec<String>,

    /// Amplification coefficient scaled by `A_PRECISION`
    pub amplification: u64,
    pub swap_fee_bps: u32,
    pub admin_fee_bps: u32,

    pub description: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PoolSettings {
    /// Check the settings against the pool limits
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("Pool id must not be empty");
        }
        if self.assets.len() < pool::MIN_ASSETS || self.assets.len() > pool::MAX_ASSETS {
            bail!(
                "Pool {} has {} assets, expected between {} and {}",
                self.id,
                self.assets.len(),
                pool::MIN_ASSETS,
                pool::MAX_ASSETS
            );
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.as_str()) {
                bail!("Pool {} lists asset {} more than once", self.id, asset);
            }
        }

        let amp = u128::from(self.amplification);
        if !(amplification::MIN_AMPLIFICATION..=amplification::MAX_AMPLIFICATION).contains(&amp) {
            bail!(
                "Pool {} amplification {} outside [{}, {}]",
                self.id,
                self.amplification,
                amplification::MIN_AMPLIFICATION,
                amplification::MAX_AMPLIFICATION
            );
        }
        if self.swap_fee_bps > fees::MAX_SWAP_FEE_BPS {
            bail!(
                "Pool {} swap fee {} bps exceeds maximum {} bps",
                self.id,
                self.swap_fee_bps,
                fees::MAX_SWAP_FEE_BPS
            );
        }
        if self.admin_fee_bps > fees::MAX_ADMIN_FEE_BPS {
            bail!(
                "Pool {} admin fee {} bps exceeds maximum {} bps",
                self.id,
                self.admin_fee_bps,
                fees::MAX_ADMIN_FEE_BPS
            );
        }
        Ok(())
    }
}

impl AmmConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Environment files sit next to the base file
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AmmConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!("Loaded {} pool definitions", config.pools.len());
        Ok(config)
    }

    /// Parse a single TOML document without file or environment layering
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AmmConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every pool entry and reject duplicate pool ids
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for settings in &self.pools {
            settings
                .validate()
                .with_context(|| format!("Invalid settings for pool {}", settings.id))?;
            if !ids.insert(settings.id.as_str()) {
                bail!("Duplicate pool id {}", settings.id);
            }
        }
        Ok(())
    }

    /// Get settings for a specific pool
    pub fn get_pool(&self, id: &str) -> Option<&PoolSettings> {
        self.pools.iter().find(|p| p.id == id)
    }
}

/// Convenience function to load configuration from the default location
pub fn load_config(environment: Option<&str>) -> Result<AmmConfig> {
    let path = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    AmmConfig::load(Some(&path), environment)
}
