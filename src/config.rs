//! Project configuration.
//!
//! The API URL comes from `sendblocks.config.json` in the project directory
//! and the bearer token from its `.auth` file. Both can be overridden from
//! the command line or the environment.

use anyhow::{Context, Result, bail};
use reconcile::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "sendblocks.config.json";
pub const AUTH_FILE: &str = ".auth";

/// Contents of `sendblocks.config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub auth_url: String,
}

impl ProjectConfig {
    /// Load the project config; a missing file yields empty values.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {} in {}", CONFIG_FILE, project_dir.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid {CONFIG_FILE} format"))
    }
}

/// Everything a command needs to reach the API and find the project.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub api_url: String,
    pub token: String,
}

impl Config {
    /// Resolve the configuration, preferring explicit values over files.
    pub fn resolve(
        project_dir: &Path,
        api_url: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let project = ProjectConfig::load(project_dir)?;

        let api_url = api_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(project.api_url);
        if api_url.trim().is_empty() {
            bail!(
                "No API URL configured. Set \"apiUrl\" in {} or SENDBLOCKS_API_URL",
                project_dir.join(CONFIG_FILE).display()
            );
        }

        let token = match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => token,
            None => read_token(project_dir)?,
        };

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            api_url,
            token,
        })
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
        }
    }
}

fn read_token(project_dir: &Path) -> Result<String> {
    let path = project_dir.join(AUTH_FILE);
    if !path.exists() {
        bail!(
            "Not logged in: {} not found. Set SENDBLOCKS_TOKEN or pass --token",
            path.display()
        );
    }
    let token = fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?
        .trim()
        .to_string();
    if token.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(token)
}
