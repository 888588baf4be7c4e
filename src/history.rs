//! Append-only archive of validation summaries.
//!
//! Archiving is best effort: a failed append is logged and never changes the
//! outcome of the validation that produced it.

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::config::HistoryConfig;
use crate::logging;
use crate::report::ValidationSummary;

/// A summary plus its generated identity
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: String,
    /// RFC 7231 date, e.g. `Sun, 18 Oct 2026 10:00:00 GMT`
    pub created_at: String,
    #[serde(flatten)]
    pub summary: Value,
}

impl HistoryRecord {
    pub fn new(summary: &ValidationSummary<'_>) -> Result<Self> {
        let summary =
            serde_json::to_value(summary).context("Failed to serialize validation summary")?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: httpdate::fmt_http_date(SystemTime::now()),
            summary,
        })
    }
}

pub trait HistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<()>;

    /// Where records go, for log messages
    fn describe(&self) -> String;
}

/// PostgREST-style table endpoint (`<endpoint>/rest/v1/<table>`)
pub struct RestHistoryStore {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl RestHistoryStore {
    pub fn new(endpoint: &str, table: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}/rest/v1/{}", endpoint.trim_end_matches('/'), table),
            api_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HistoryStore for RestHistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Prefer", "return=minimal")
            .json(record);
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }
        let response = request
            .send()
            .with_context(|| format!("History request failed: {}", self.url))?;
        ensure_success(response, &self.url)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn ensure_success(response: Response, url: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().unwrap_or_default();
    bail!("History request failed ({}) {}: {}", status, url, body);
}

/// One JSON object per line
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for FileHistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock history file: {}", self.path.display()))?;
        let written = file.write_all(line.as_bytes());
        FileExt::unlock(&file)?;
        written.with_context(|| format!("Failed to append to {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Stores enabled by the configuration, REST first.
pub fn stores_from_config(config: &HistoryConfig) -> Vec<Box<dyn HistoryStore>> {
    let mut stores: Vec<Box<dyn HistoryStore>> = Vec::new();
    if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            logging::warn("History endpoint configured without an API key");
        }
        stores.push(Box::new(RestHistoryStore::new(endpoint, &config.table, api_key)));
    }
    if let Some(file) = config.file.as_deref().filter(|f| !f.trim().is_empty()) {
        stores.push(Box::new(FileHistoryStore::new(file)));
    }
    stores
}

/// Append `summary` to every store. Returns whether all appends succeeded;
/// failures are only logged.
pub fn record_summary(stores: &[Box<dyn HistoryStore>], summary: &ValidationSummary<'_>) -> bool {
    if stores.is_empty() {
        return true;
    }
    let record = match HistoryRecord::new(summary) {
        Ok(record) => record,
        Err(e) => {
            logging::warn(&format!("Validation history not recorded: {:#}", e));
            return false;
        }
    };

    let mut all_ok = true;
    for store in stores {
        match store.append(&record) {
            Ok(()) => logging::debug(&format!("Recorded validation {} in {}", record.id, store.describe())),
            Err(e) => {
                all_ok = false;
                logging::warn(&format!(
                    "Failed to record validation history in {}: {:#}",
                    store.describe(),
                    e
                ));
            }
        }
    }
    all_ok
}
