//! Detection of overly generic translation keys (`title`, `label`, ...) and
//! suggestions for hierarchical replacements derived from where they are used.

use regex::Regex;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path};
use std::sync::OnceLock;

use crate::extractor::{ExtractionResult, Occurrence};
use crate::fixer::WriteFailure;
use crate::fs::FileSystem;
use crate::logging;

/// How many lines above an occurrence are searched for the enclosing component
pub const DECLARATION_LOOKBEHIND: usize = 5;

fn declaration_regex() -> &'static Regex {
    static DECLARATION_REGEX: OnceLock<Regex> = OnceLock::new();
    DECLARATION_REGEX.get_or_init(|| {
        Regex::new(
            r"\b(?:function|class)\s+([A-Z][A-Za-z0-9_]*)|\bconst\s+([A-Z][A-Za-z0-9_]*)\s*(?::[^=]*)?=\s*(?:function\b|\()",
        )
        .expect("DECLARATION_REGEX pattern is invalid - this is a bug")
    })
}

/// A generic key use together with its proposed replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixSuggestion {
    pub file: String,
    pub line: usize,
    /// Byte offset of the key literal's opening quote within the line
    pub column: usize,
    pub original_key: String,
    pub suggested_key: String,
    /// Source line as found, without its line terminator
    pub original_line: String,
    /// Same line with the quoted key swapped for the suggestion
    pub replacement_line: String,
}

/// Single-segment keys matching the generic list, compared case-insensitively.
pub struct GenericKeyFinder {
    generic: HashSet<String>,
}

impl GenericKeyFinder {
    pub fn new(generic_keys: &[String]) -> Self {
        Self {
            generic: generic_keys.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn is_generic(&self, key: &str) -> bool {
        !key.contains('.') && self.generic.contains(&key.to_lowercase())
    }

    /// Occurrences of generic keys, in extraction order.
    pub fn find_generic_key_usage<'a>(&self, extraction: &'a ExtractionResult) -> Vec<&'a Occurrence> {
        extraction
            .occurrences
            .iter()
            .filter(|o| self.is_generic(&o.key))
            .collect()
    }
}

/// `CommunityHeader` -> `community-header`, `HTMLBlock` -> `html-block`.
pub fn to_hyphen_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if *c == '_' || *c == ' ' || *c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !out.ends_with('-') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_end_matches('-').to_string()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Namespace from the nearest `pages`, `components` or `sections` ancestor:
/// the segment after `pages`/`components`, the literal `sections`, else `common`.
pub fn derive_namespace(file: &Path) -> String {
    let segments: Vec<String> = file
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(str::to_string),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return "common".to_string();
    }
    let last = segments.len() - 1;

    for i in (0..last).rev() {
        match segments[i].as_str() {
            "pages" | "components" => {
                let next = if i + 1 == last {
                    file_stem(file)
                } else {
                    segments[i + 1].clone()
                };
                return to_hyphen_case(&next);
            }
            "sections" => return "sections".to_string(),
            _ => {}
        }
    }
    "common".to_string()
}

/// Section from the closest component declaration in the preceding lines,
/// else the lowercased file name.
pub fn derive_section(file: &Path, lines: &[&str], line: usize) -> String {
    let end = line.saturating_sub(1).min(lines.len());
    let start = end.saturating_sub(DECLARATION_LOOKBEHIND);

    for candidate in lines[start..end].iter().rev() {
        if let Some(caps) = declaration_regex().captures(candidate) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                return to_hyphen_case(name.as_str());
            }
        }
    }
    file_stem(file).to_lowercase()
}

/// Swap the quoted literal of `old` starting at byte `column` of `line` for
/// `new`, keeping its quote style. Other literals on the line are left alone.
pub fn replace_key_at(line: &str, column: usize, old: &str, new: &str) -> Option<String> {
    let rest = line.get(column..)?;
    let quote = rest.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'))?;
    let literal = format!("{q}{old}{q}", q = quote);
    let tail = rest.strip_prefix(literal.as_str())?;
    Some(format!("{}{q}{new}{q}{}", &line[..column], tail, q = quote))
}

/// Build the suggestion for one occurrence, given its file's contents.
pub fn suggest(occurrence: &Occurrence, source: &str) -> FixSuggestion {
    let path = Path::new(&occurrence.file);
    let lines: Vec<&str> = source.lines().collect();
    let namespace = derive_namespace(path);
    let section = derive_section(path, &lines, occurrence.line);
    let suggested_key = format!(
        "{}.{}.{}",
        namespace,
        section,
        occurrence.key.to_lowercase()
    );

    let original_line = lines
        .get(occurrence.line.saturating_sub(1))
        .map(|l| l.to_string())
        .unwrap_or_default();
    let replacement_line =
        replace_key_at(&original_line, occurrence.column, &occurrence.key, &suggested_key)
            .unwrap_or_else(|| original_line.clone());

    FixSuggestion {
        file: occurrence.file.clone(),
        line: occurrence.line,
        column: occurrence.column,
        original_key: occurrence.key.clone(),
        suggested_key,
        original_line,
        replacement_line,
    }
}

fn group_by_file<'a, T: 'a, I, K>(items: I, file_of: K) -> BTreeMap<&'a str, Vec<&'a T>>
where
    I: IntoIterator<Item = &'a T>,
    K: Fn(&'a T) -> &'a str,
{
    let mut grouped: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for item in items {
        grouped.entry(file_of(item)).or_default().push(item);
    }
    grouped
}

/// Suggestions for every generic occurrence. Each file is read once.
pub fn suggest_all<F: FileSystem>(occurrences: &[&Occurrence], fs: &F) -> Vec<FixSuggestion> {
    let mut suggestions = Vec::new();

    for (file, group) in group_by_file(occurrences.iter().copied(), |o| o.file.as_str()) {
        let source = match fs.read_to_string(Path::new(file)) {
            Ok(source) => source,
            Err(e) => {
                logging::warn(&format!("Cannot read {} for suggestions: {}", file, e));
                continue;
            }
        };
        suggestions.extend(group.into_iter().map(|occ| suggest(occ, &source)));
    }
    suggestions
}

/// Result of writing suggestions back to source files
#[derive(Debug, Default, Serialize)]
pub struct ApplyOutcome {
    pub files_updated: Vec<String>,
    pub replacements: usize,
    pub errors: Vec<WriteFailure>,
}

/// Rewrite source files, one read and one write per file. A file that fails
/// is recorded and the rest are still processed.
pub fn apply_suggestions<F: FileSystem>(suggestions: &[FixSuggestion], fs: &F) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for (file, mut group) in group_by_file(suggestions, |s| s.file.as_str()) {
        // Right to left, so a rewrite never shifts the column of one still pending.
        group.sort_by_key(|s| Reverse((s.line, s.column)));
        let path = Path::new(file);
        let result = fs.with_exclusive_lock(path, || {
            let content = fs.read_to_string(path)?;
            let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
            let mut count = 0usize;

            for suggestion in &group {
                let Some(line) = lines.get_mut(suggestion.line.saturating_sub(1)) else {
                    continue;
                };
                if let Some(updated) = replace_key_at(
                    line,
                    suggestion.column,
                    &suggestion.original_key,
                    &suggestion.suggested_key,
                ) {
                    *line = updated;
                    count += 1;
                }
            }

            if count > 0 {
                fs.atomic_write(path, lines.concat().as_bytes())?;
            }
            Ok(count)
        });

        match result {
            Ok(0) => {}
            Ok(count) => {
                outcome.replacements += count;
                outcome.files_updated.push(file.to_string());
            }
            Err(e) => {
                logging::warn(&format!("Failed to update {}: {}", file, e));
                outcome.errors.push(WriteFailure {
                    path: file.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// Progress of moving one source file off generic keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationEntry {
    pub file: String,
    pub total_occurrences: usize,
    pub generic_occurrences: usize,
    pub status: MigrationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Migrated,
    Pending,
}

impl MigrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationStatus::Migrated => "migrated",
            MigrationStatus::Pending => "pending",
        }
    }
}

/// One entry per source file that uses translation keys.
pub fn migration_progress(extraction: &ExtractionResult, finder: &GenericKeyFinder) -> Vec<MigrationEntry> {
    let mut entries = Vec::new();
    for (file, group) in group_by_file(&extraction.occurrences, |o| o.file.as_str()) {
        let generic = group.iter().filter(|o| finder.is_generic(&o.key)).count();
        entries.push(MigrationEntry {
            file: file.to_string(),
            total_occurrences: group.len(),
            generic_occurrences: generic,
            status: if generic == 0 {
                MigrationStatus::Migrated
            } else {
                MigrationStatus::Pending
            },
        });
    }
    entries
}
