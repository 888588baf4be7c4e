//! Fills keys missing from one language with a tagged copy of the other
//! language's text, e.g. `"[FR] Cancel"`.

use serde::Serialize;
use serde_json::Value;

use crate::dictionary::{Dictionary, DictionaryLoader, FlattenedDictionary, InsertOutcome};
use crate::differ::MissingKeys;
use crate::fs::FileSystem;
use crate::logging;

/// A file that could not be written back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detail")]
pub enum FixAction {
    AddedPlaceholder,
    /// The path is blocked by an existing value of another shape; nothing was changed
    SkippedConflict(String),
}

/// One entry per key the applier looked at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixRecord {
    pub key: String,
    /// Language that received (or would have received) the placeholder
    pub language: String,
    pub action: FixAction,
}

impl FixRecord {
    pub fn applied(&self) -> bool {
        self.action == FixAction::AddedPlaceholder
    }
}

/// `[FR] Cancel`
pub fn placeholder_value(language: &str, other_value: &str) -> String {
    format!("[{}] {}", language.to_uppercase(), other_value)
}

fn fill_missing(
    keys: &[String],
    language: &str,
    source: &FlattenedDictionary,
    target: &mut Dictionary,
    records: &mut Vec<FixRecord>,
) {
    for key in keys {
        let other = source.get(key).map(String::as_str).unwrap_or_default();
        let value = Value::String(placeholder_value(language, other));
        let action = match target.insert_leaf(key, value) {
            InsertOutcome::Added => FixAction::AddedPlaceholder,
            // Already filled since the diff was computed; leave it alone.
            InsertOutcome::Existed => continue,
            InsertOutcome::Conflict(conflict) => {
                logging::warn(&format!("Cannot add '{}' to {}: {}", key, language, conflict));
                FixAction::SkippedConflict(conflict.to_string())
            }
        };
        records.push(FixRecord {
            key: key.clone(),
            language: language.to_string(),
            action,
        });
    }
}

/// Insert placeholders for every missing key in both dictionaries.
///
/// Existing values are never replaced, so running this again after a human
/// translation has landed changes nothing. `missing` must come from a diff of
/// these exact dictionaries.
pub fn apply_missing_key_fixes(
    missing: &MissingKeys,
    primary: &mut Dictionary,
    secondary: &mut Dictionary,
) -> Vec<FixRecord> {
    // Snapshot both sides first so values inserted in one pass never feed the other.
    let primary_flat = primary.flatten();
    let secondary_flat = secondary.flatten();
    let mut records = Vec::new();

    fill_missing(
        &missing.missing_in_secondary,
        &missing.secondary_language,
        &primary_flat,
        secondary,
        &mut records,
    );
    fill_missing(
        &missing.missing_in_primary,
        &missing.primary_language,
        &secondary_flat,
        primary,
        &mut records,
    );

    records
}

/// Result of persisting fixed dictionaries
#[derive(Debug, Default, Serialize)]
pub struct FixOutcome {
    pub records: Vec<FixRecord>,
    pub written_files: Vec<String>,
    pub errors: Vec<WriteFailure>,
}

impl FixOutcome {
    pub fn applied_count(&self) -> usize {
        self.records.iter().filter(|r| r.applied()).count()
    }
}

/// Write every dictionary that received a placeholder. A failed write is
/// recorded and the remaining files are still attempted.
pub fn write_fixed_dictionaries<F: FileSystem>(
    loader: &DictionaryLoader<'_, F>,
    records: Vec<FixRecord>,
    dictionaries: &[(&str, &Dictionary)],
) -> FixOutcome {
    let mut outcome = FixOutcome::default();

    for (language, dict) in dictionaries {
        let touched = records
            .iter()
            .any(|r| r.applied() && r.language == *language);
        if !touched {
            continue;
        }
        match loader.save(language, dict) {
            Ok(path) => outcome.written_files.push(path.display().to_string()),
            Err(e) => {
                let path = loader.path_for(language).display().to_string();
                logging::warn(&format!("Failed to write {}: {:#}", path, e));
                outcome.errors.push(WriteFailure {
                    path,
                    message: format!("{:#}", e),
                });
            }
        }
    }

    outcome.records = records;
    outcome
}
