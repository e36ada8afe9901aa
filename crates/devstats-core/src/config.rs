use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Plain environment variables honoured on top of `DEVSTATS__*`.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_ORG_VAR: &str = "GITHUB_ORG";
pub const GITHUB_ENTERPRISE_VAR: &str = "GITHUB_ENTERPRISE";
pub const PORT_CLIENT_ID_VAR: &str = "PORT_CLIENT_ID";
pub const PORT_CLIENT_SECRET_VAR: &str = "PORT_CLIENT_SECRET";

const WELL_KNOWN_VARS: [(&str, &str); 5] = [
    (GITHUB_TOKEN_VAR, "github.token"),
    (GITHUB_ORG_VAR, "github.org"),
    (GITHUB_ENTERPRISE_VAR, "github.enterprise"),
    (PORT_CLIENT_ID_VAR, "catalog.client_id"),
    (PORT_CLIENT_SECRET_VAR, "catalog.client_secret"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    // Do not serialize secrets; allow deserialization from config/env only.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub enterprise: Option<String>,
    #[serde(default = "GitHubSettings::default_api_url")]
    pub api_url: String,
    #[serde(default = "GitHubSettings::default_api_version")]
    pub api_version: String,
    #[serde(default = "GitHubSettings::default_page_size")]
    pub page_size: u8,
    /// Upper bound on pages followed per listing; `None` follows every page
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default = "GitHubSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GitHubSettings {
    fn default_api_url() -> String {
        "https://api.github.com".to_string()
    }

    fn default_api_version() -> String {
        "2022-11-28".to_string()
    }

    fn default_page_size() -> u8 {
        100
    }

    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            org: None,
            enterprise: None,
            api_url: Self::default_api_url(),
            api_version: Self::default_api_version(),
            page_size: Self::default_page_size(),
            max_pages: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<SecretString>,
    #[serde(default = "CatalogSettings::default_api_url")]
    pub api_url: String,
    /// Blueprint holding one entity per developer
    #[serde(default = "CatalogSettings::default_blueprint")]
    pub blueprint: String,
    #[serde(default = "CatalogSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CatalogSettings {
    fn default_api_url() -> String {
        "https://api.getport.io/v1".to_string()
    }

    fn default_blueprint() -> String {
        "user".to_string()
    }

    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: Self::default_api_url(),
            blueprint: Self::default_blueprint(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Which command the settings are checked against; the enterprise is only
/// needed for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    JoinDates,
    DeveloperStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Load from `.env`, config files and the process environment.
    pub fn load() -> Result<Self> {
        // a missing .env is the normal case
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        let config_dir = Self::default_config_dir();
        let settings = Self::load_from_sources(&config_dir, |name| env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// `DEVSTATS_CONFIG_DIR` if set, otherwise the working directory.
    pub fn default_config_dir() -> PathBuf {
        env::var("DEVSTATS_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|_| env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."))
    }

    pub fn load_from_sources<F>(config_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("devstats.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("devstats.local.toml")).required(false))
            .add_source(cfg::Environment::with_prefix("DEVSTATS").separator("__"));

        for (var, key) in WELL_KNOWN_VARS {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder
                .set_override_option(key, value)
                .with_context(|| format!("applying {}", var))?;
        }

        let settings: Settings = builder
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        info!(
            "Configuration loaded from {:?} (org: {})",
            config_dir,
            settings.github.org.as_deref().unwrap_or("<unset>")
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.github.api_url.trim().is_empty(),
            "github.api_url cannot be empty"
        );
        anyhow::ensure!(
            (1..=100).contains(&self.github.page_size),
            "github.page_size must be 1..=100"
        );
        anyhow::ensure!(
            self.github.max_pages != Some(0),
            "github.max_pages must be > 0 when set"
        );
        anyhow::ensure!(
            self.github.timeout_secs > 0,
            "github.timeout_secs must be > 0"
        );
        anyhow::ensure!(
            !self.catalog.api_url.trim().is_empty(),
            "catalog.api_url cannot be empty"
        );
        anyhow::ensure!(
            !self.catalog.blueprint.trim().is_empty(),
            "catalog.blueprint cannot be empty"
        );
        anyhow::ensure!(
            self.catalog.timeout_secs > 0,
            "catalog.timeout_secs must be > 0"
        );
        Ok(())
    }

    /// Names of the environment variables a command needs but that are unset.
    pub fn missing_for(&self, requirement: Requirement) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.github.token.is_none() {
            missing.push(GITHUB_TOKEN_VAR);
        }
        if self.github.org.is_none() {
            missing.push(GITHUB_ORG_VAR);
        }
        if requirement == Requirement::JoinDates && self.github.enterprise.is_none() {
            missing.push(GITHUB_ENTERPRISE_VAR);
        }
        if self.catalog.client_id.is_none() {
            missing.push(PORT_CLIENT_ID_VAR);
        }
        if self.catalog.client_secret.is_none() {
            missing.push(PORT_CLIENT_SECRET_VAR);
        }
        missing
    }
}
