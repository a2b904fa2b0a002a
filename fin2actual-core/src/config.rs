//! Configuration management
//!
//! Settings live in `settings.json` in the fin2actual directory:
//! ```json
//! {
//!   "financier": { "exportPath": "/path/to/financier.json" },
//!   "actual": { "url": "http://localhost:5007", "apiKey": "...", "budgetId": "..." },
//!   "import": { "label": "financier" }
//! }
//! ```
//! Environment variables override the file; CLI flags override both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result as DomainResult};

pub const ENV_FINANCIER_JSON: &str = "FINANCIER_JSON";
pub const ENV_ACTUAL_URL: &str = "ACTUAL_URL";
pub const ENV_ACTUAL_API_KEY: &str = "ACTUAL_API_KEY";
pub const ENV_ACTUAL_BUDGET_ID: &str = "ACTUAL_BUDGET_ID";
pub const ENV_ACTUAL_PASSWORD: &str = "ACTUAL_PASSWORD";

pub const DEFAULT_IMPORT_LABEL: &str = "financier";

/// Raw settings.json structure; unknown keys survive a save
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    financier: FinancierSettings,
    #[serde(default)]
    actual: ActualConfig,
    #[serde(default)]
    import: ImportSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancierSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

/// Connection settings for an Actual HTTP API server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    /// Sync id of the budget file to import into
    #[serde(default)]
    pub budget_id: String,
    /// End-to-end encryption password of the budget, if it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ActualConfig {
    /// Check the settings before any request is made
    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(Error::Config(format!(
                "Actual server URL is not set (settings.json or {})",
                ENV_ACTUAL_URL
            )));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid Actual server URL '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Actual server URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api_key.is_empty() {
            return Err(Error::Config(format!(
                "Actual API key is not set (settings.json or {})",
                ENV_ACTUAL_API_KEY
            )));
        }
        if self.budget_id.is_empty() {
            return Err(Error::Config(format!(
                "Actual budget id is not set (settings.json or {})",
                ENV_ACTUAL_BUDGET_ID
            )));
        }
        Ok(())
    }
}

/// Effective fin2actual configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub financier_json: Option<PathBuf>,
    pub actual: ActualConfig,
    pub import_label: String,
    raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            financier_json: raw.financier.export_path.clone(),
            actual: raw.actual.clone(),
            import_label: raw
                .import
                .label
                .clone()
                .unwrap_or_else(|| DEFAULT_IMPORT_LABEL.to_string()),
            raw_settings: raw,
        }
    }

    /// Load settings.json from `dir` and apply environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, |key| std::env::var(key).ok())
    }

    /// Like `load`, reading overrides through `env` instead of the process
    pub fn load_with_env(dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let settings_path = dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_settings(raw);
        config.apply_env(env);
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(path) = set(ENV_FINANCIER_JSON) {
            self.financier_json = Some(PathBuf::from(path));
        }
        if let Some(url) = set(ENV_ACTUAL_URL) {
            self.actual.url = url;
        }
        if let Some(key) = set(ENV_ACTUAL_API_KEY) {
            self.actual.api_key = key;
        }
        if let Some(budget) = set(ENV_ACTUAL_BUDGET_ID) {
            self.actual.budget_id = budget;
        }
        if let Some(password) = set(ENV_ACTUAL_PASSWORD) {
            self.actual.password = Some(password);
        }
    }

    /// Save to `dir`, keeping settings this tool doesn't manage
    pub fn save(&self, dir: &Path) -> Result<()> {
        let settings_path = dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_else(|_| self.raw_settings.clone())
        } else {
            self.raw_settings.clone()
        };

        settings.financier.export_path = self.financier_json.clone();
        settings.actual = self.actual.clone();
        settings.import.label = Some(self.import_label.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// Printable view with secrets masked
    pub fn masked(&self) -> ConfigView {
        ConfigView {
            financier_json: self
                .financier_json
                .as_ref()
                .map(|p| p.display().to_string()),
            actual_url: self.actual.url.clone(),
            actual_api_key: mask(&self.actual.api_key),
            actual_budget_id: self.actual.budget_id.clone(),
            actual_password: self.actual.password.as_deref().map(mask),
            import_label: self.import_label.clone(),
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// Configuration as shown by `fin2actual config`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub financier_json: Option<String>,
    pub actual_url: String,
    pub actual_api_key: String,
    pub actual_budget_id: String,
    pub actual_password: Option<String>,
    pub import_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn valid() -> ActualConfig {
        ActualConfig {
            url: "http://localhost:5007".to_string(),
            api_key: "secret".to_string(),
            budget_id: "budget-1".to_string(),
            password: None,
        }
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert!(config.financier_json.is_none());
        assert_eq!(config.import_label, DEFAULT_IMPORT_LABEL);
        assert!(config.actual.url.is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{ "actual": { "url": "http://file:5007", "apiKey": "k", "budgetId": "b" } }"#,
        )
        .unwrap();

        let config = Config::load_with_env(dir.path(), |key| match key {
            ENV_ACTUAL_URL => Some("https://env.example".to_string()),
            ENV_FINANCIER_JSON => Some("/tmp/export.json".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.actual.url, "https://env.example");
        assert_eq!(config.actual.api_key, "k");
        assert_eq!(config.financier_json, Some(PathBuf::from("/tmp/export.json")));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{ "theme": "dark", "import": { "label": "old" } }"#,
        )
        .unwrap();

        let mut config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(config.import_label, "old");
        config.actual = valid();
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["actual"]["budgetId"], "budget-1");
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let mut config = valid();
        config.url = "ftp://localhost".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = valid();
        config.url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.budget_id.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_masked_hides_secrets() {
        let mut config = Config::default();
        config.actual = valid();
        config.actual.password = Some("hunter2".to_string());
        let view = config.masked();
        assert_eq!(view.actual_api_key, "********");
        assert_eq!(view.actual_password.as_deref(), Some("********"));
        assert_eq!(view.actual_budget_id, "budget-1");
    }
}
