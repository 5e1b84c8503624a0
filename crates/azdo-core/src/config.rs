//! Configuration management for azdo-mcp.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/azdo-mcp/config.toml`
//! - **Windows**: `%APPDATA%\azdo-mcp\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use azdo_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("azure_devops.organization", "contoso")?;
//! config.set("mcp.domains", "work-items, builds")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "azdo-mcp";

const CLOUD_HOST: &str = "dev.azure.com";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps organization settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_devops: Option<AzureDevOpsConfig>,

    /// MCP server settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<McpConfig>,
}

/// Azure DevOps organization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureDevOpsConfig {
    /// Organization name (e.g., "contoso")
    pub organization: String,
    /// Collection URL for on-premises servers; replaces every cloud host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

/// MCP server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    /// Enabled tool domains; empty means all
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Base URLs of the Azure DevOps services for one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Core, work, work item, build, wiki and test services
    pub org_url: String,
    /// Identity service
    pub identity_url: String,
    /// Release management service
    pub release_url: String,
}

impl Endpoints {
    /// Hosted endpoints, or one collection URL for every service.
    pub fn new(organization: &str, server_url: Option<&str>) -> Self {
        match server_url.map(|url| url.trim_end_matches('/')) {
            Some(url) if !url.is_empty() => Self {
                org_url: url.to_string(),
                identity_url: url.to_string(),
                release_url: url.to_string(),
            },
            _ => Self {
                org_url: format!("https://{}/{}", CLOUD_HOST, organization),
                identity_url: format!("https://vssps.{}/{}", CLOUD_HOST, organization),
                release_url: format!("https://vsrm.{}/{}", CLOUD_HOST, organization),
            },
        }
    }

    /// Point every service at one base URL (used by tests against a mock server).
    pub fn single(base_url: &str) -> Self {
        Self::new("", Some(base_url))
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Configured organization name, if any.
    pub fn organization(&self) -> Option<&str> {
        self.azure_devops
            .as_ref()
            .map(|c| c.organization.as_str())
            .filter(|org| !org.is_empty())
    }

    /// Configured domain names (empty when unset).
    pub fn domains(&self) -> &[String] {
        self.mcp.as_ref().map(|m| m.domains.as_slice()).unwrap_or(&[])
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `azure_devops.organization`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let config = self.azure_devops.get_or_insert_with(AzureDevOpsConfig::default);
                match field {
                    "organization" | "org" => config.organization = value.to_string(),
                    "server_url" | "url" => config.server_url = Some(value.to_string()),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown azure_devops config field: {}",
                            field
                        )))
                    }
                }
            }
            "mcp" => {
                let config = self.mcp.get_or_insert_with(McpConfig::default);
                match field {
                    "domains" => {
                        config.domains = value
                            .split([',', ' '])
                            .map(str::trim)
                            .filter(|d| !d.is_empty())
                            .map(str::to_string)
                            .collect()
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown mcp config field: {}",
                            field
                        )))
                    }
                }
            }
            _ => {
                return Err(Error::Config(format!("Unknown config section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let Some(config) = &self.azure_devops else {
                    return Ok(None);
                };
                match field {
                    "organization" | "org" => Ok(Some(config.organization.clone())),
                    "server_url" | "url" => Ok(config.server_url.clone()),
                    _ => Err(Error::Config(format!(
                        "Unknown azure_devops config field: {}",
                        field
                    ))),
                }
            }
            "mcp" => {
                let Some(config) = &self.mcp else {
                    return Ok(None);
                };
                match field {
                    "domains" => Ok(Some(config.domains.join(","))),
                    _ => Err(Error::Config(format!(
                        "Unknown mcp config field: {}",
                        field
                    ))),
                }
            }
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split('.').collect::<Vec<_>>()[..] {
        [section, field] => Ok((section, field)),
        _ => Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
