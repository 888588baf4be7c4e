use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "i18n-guard.json";

/// Environment variable holding the history API key when it is not in the config
pub const HISTORY_KEY_ENV: &str = "I18N_GUARD_HISTORY_KEY";

/// Configuration for i18n-guard
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root directory of the UI source tree to scan
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// File extensions (without dot) considered source files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns, relative to `source_dir`, excluded from scanning
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Translation function names (e.g., ["t"])
    #[serde(default = "default_functions")]
    pub functions: Vec<String>,

    /// JSX attributes carrying a translation key (e.g., ["translationKey"])
    #[serde(default = "default_jsx_attributes")]
    pub jsx_attributes: Vec<String>,

    /// Directory holding `<lang>.<ext>` locale files
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,

    /// Exactly two language codes; the first one is the primary language
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Locale file format
    #[serde(default)]
    pub locale_format: LocaleFormat,

    /// Single-segment keys considered too generic
    #[serde(default = "default_generic_keys")]
    pub generic_keys: Vec<String>,

    #[serde(default)]
    pub reports: ReportPaths,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocaleFormat {
    #[default]
    Json,
    Json5,
}

impl LocaleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            LocaleFormat::Json => "json",
            LocaleFormat::Json5 => "json5",
        }
    }
}

/// Output paths used by `report` and as defaults for `validate --output`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReportPaths {
    #[serde(default = "default_markdown_report")]
    pub markdown: String,
    #[serde(default = "default_json_report")]
    pub json: String,
    #[serde(default = "default_missing_csv")]
    pub missing_csv: String,
    #[serde(default = "default_generic_csv")]
    pub generic_csv: String,
    #[serde(default = "default_migration_csv")]
    pub migration_csv: String,
}

impl Default for ReportPaths {
    fn default() -> Self {
        Self {
            markdown: default_markdown_report(),
            json: default_json_report(),
            missing_csv: default_missing_csv(),
            generic_csv: default_generic_csv(),
            migration_csv: default_migration_csv(),
        }
    }
}

/// Where validation summaries are archived
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Base URL of a PostgREST-compatible API (e.g. a hosted Postgres project)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_history_table")]
    pub table: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Local JSON-lines file, appended to on every run
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            table: default_history_table(),
            api_key: None,
            file: None,
        }
    }
}

impl HistoryConfig {
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some() || self.file.is_some()
    }

    /// Configured key, else the environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(HISTORY_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ignore() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

fn default_functions() -> Vec<String> {
    vec!["t".to_string()]
}

fn default_jsx_attributes() -> Vec<String> {
    vec!["translationKey".to_string(), "i18nKey".to_string()]
}

fn default_locales_dir() -> String {
    "src/i18n/locales".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string()]
}

pub fn default_generic_keys() -> Vec<String> {
    [
        "title",
        "label",
        "description",
        "button",
        "text",
        "name",
        "message",
        "placeholder",
        "content",
        "header",
        "subtitle",
        "submit",
        "cancel",
        "save",
        "close",
        "error",
        "loading",
        "value",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_markdown_report() -> String {
    "i18n-report.md".to_string()
}

fn default_json_report() -> String {
    "i18n-report.json".to_string()
}

fn default_missing_csv() -> String {
    "i18n-missing-keys.csv".to_string()
}

fn default_generic_csv() -> String {
    "i18n-generic-keys.csv".to_string()
}

fn default_migration_csv() -> String {
    "i18n-migration.csv".to_string()
}

fn default_history_table() -> String {
    "i18n_validation_history".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            extensions: default_extensions(),
            ignore: default_ignore(),
            functions: default_functions(),
            jsx_attributes: default_jsx_attributes(),
            locales_dir: default_locales_dir(),
            languages: default_languages(),
            locale_format: LocaleFormat::default(),
            generic_keys: default_generic_keys(),
            reports: ReportPaths::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json_string(json_str: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json_str).with_context(|| "Failed to parse config JSON string")?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from default config file, or return default config
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.len() != 2 {
            bail!(
                "exactly two languages are required, got {}: {:?}",
                self.languages.len(),
                self.languages
            );
        }
        if self.languages[0] == self.languages[1] {
            bail!("languages must be distinct, got '{}' twice", self.languages[0]);
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            bail!("language codes must not be empty");
        }
        if self.functions.is_empty() && self.jsx_attributes.is_empty() {
            bail!("at least one of `functions` or `jsxAttributes` must be set");
        }
        Ok(())
    }

    pub fn primary_language(&self) -> &str {
        &self.languages[0]
    }

    pub fn secondary_language(&self) -> &str {
        &self.languages[1]
    }

    pub fn source_root(&self) -> PathBuf {
        PathBuf::from(&self.source_dir)
    }

    pub fn locales_path(&self) -> PathBuf {
        PathBuf::from(&self.locales_dir)
    }
}
