use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::PlannerError;

pub const PLANNER_DIR: &str = ".mealplanner";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub version: String,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

pub fn default_catalog_path() -> String {
    "recipes.json".to_string()
}

pub fn default_state_dir() -> String {
    format!("{}/state", PLANNER_DIR)
}

pub fn default_export_dir() -> String {
    "exports".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            catalog_path: default_catalog_path(),
            state_dir: default_state_dir(),
            export_dir: default_export_dir(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        let parts: Vec<&str> = self.version.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || p.parse::<u32>().is_err()) {
            return Err(PlannerError::Config(format!(
                "version '{}' is not of the form x.y.z",
                self.version
            )));
        }
        for (field, value) in [
            ("catalog_path", &self.catalog_path),
            ("state_dir", &self.state_dir),
            ("export_dir", &self.export_dir),
        ] {
            if value.trim().is_empty() {
                return Err(PlannerError::Config(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    pub fn catalog_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.catalog_path)
    }

    pub fn state_dir(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.state_dir)
    }

    pub fn export_dir(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.export_dir)
    }
}

pub fn config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(PLANNER_DIR).join(CONFIG_FILE)
}

pub fn logs_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(PLANNER_DIR).join("logs")
}

pub async fn load_planner_config(work_dir: &Path) -> Result<Option<PlannerConfig>> {
    let path = config_path(work_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: PlannerConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .context("Failed to validate loaded config.json")?;
    Ok(Some(config))
}

/// Makes sure the planner directory exists, writing a default config on first
/// use, and returns the effective config.
pub async fn ensure_planner_dir(work_dir: &Path) -> Result<PlannerConfig> {
    let planner_dir = work_dir.join(PLANNER_DIR);
    if !planner_dir.exists() {
        fs::create_dir_all(&planner_dir).await?;
    }

    let config = match load_planner_config(work_dir).await? {
        Some(config) => config,
        None => {
            let config = PlannerConfig::default();
            let content = serde_json::to_string_pretty(&config)?;
            fs::write(config_path(work_dir), content).await?;
            config
        }
    };

    fs::create_dir_all(config.state_dir(work_dir)).await?;
    fs::create_dir_all(logs_dir(work_dir)).await?;

    Ok(config)
}
