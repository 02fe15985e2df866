//! Configuration loading and types
//!
//! Precedence, lowest first: defaults, TOML file, `ANSIBLE_TF_*` environment
//! variables, command-line flags (applied in `main`).

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tfinv_inventory::DEFAULT_PROVIDER_PREFIX;
use tfinv_inventory::terraform::{DEFAULT_BINARY, DEFAULT_WORKSPACE};

/// Path of an explicit configuration file
pub const ENV_CONFIG: &str = "TFINV_CONFIG";
/// terraform binary override
pub const ENV_BIN: &str = "ANSIBLE_TF_BIN";
/// terraform working directory override
pub const ENV_DIR: &str = "ANSIBLE_TF_DIR";
/// terraform workspace override
pub const ENV_WORKSPACE: &str = "ANSIBLE_TF_WS_NAME";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How to run terraform
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// How to interpret state
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terraform: TerraformConfig::default(),
            inventory: InventoryConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// terraform invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// Binary name or path
    #[serde(default = "default_bin")]
    pub bin: String,
    /// Working directory (current directory when unset)
    pub dir: Option<PathBuf>,
    /// Workspace to select
    #[serde(default = "default_workspace")]
    pub workspace: String,
    /// Per-command timeout in seconds (no timeout when unset)
    pub timeout_secs: Option<u64>,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            bin: default_bin(),
            dir: None,
            workspace: default_workspace(),
            timeout_secs: None,
        }
    }
}

/// State interpretation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Type prefix of inventory resources
    #[serde(default = "default_provider_prefix")]
    pub provider_prefix: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            provider_prefix: default_provider_prefix(),
        }
    }
}

fn default_bin() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

fn default_provider_prefix() -> String {
    DEFAULT_PROVIDER_PREFIX.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return Self::load(Path::new(&path));
        }

        let paths = [
            Some(PathBuf::from("tfinv.toml")),
            dirs::config_dir().map(|p| p.join("tfinv/tfinv.toml")),
        ];

        for path in paths.into_iter().flatten() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Config::default())
    }

    /// Apply `ANSIBLE_TF_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply `ANSIBLE_TF_*` overrides from an arbitrary lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bin) = lookup(ENV_BIN) {
            self.terraform.bin = bin;
        }
        if let Some(dir) = lookup(ENV_DIR) {
            self.terraform.dir = Some(PathBuf::from(dir));
        }
        if let Some(workspace) = lookup(ENV_WORKSPACE) {
            self.terraform.workspace = workspace;
        }
    }
}
