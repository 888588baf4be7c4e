//! Locale dictionaries: the nested key tree for one language, its flattened
//! dotted-path view, and loading/saving through a [`FileSystem`].

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::LocaleFormat;
use crate::error::{LoadError, LoadResult};
use crate::fs::FileSystem;

/// Dotted path -> leaf text. Always derived from a [`Dictionary`], never edited in place.
pub type FlattenedDictionary = BTreeMap<String, String>;

/// A node of the locale tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryNode {
    /// Any non-object value. Strings are the norm; arrays, numbers and
    /// booleans are kept as-is and never recursed into.
    Leaf(Value),
    Branch(Dictionary),
}

impl DictionaryNode {
    pub fn text(value: impl Into<String>) -> Self {
        DictionaryNode::Leaf(Value::String(value.into()))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, DictionaryNode::Branch(_))
    }
}

/// Nested segment -> node mapping for one language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: BTreeMap<String, DictionaryNode>,
}

/// Why a path could not be filled in
#[derive(Debug, Clone, PartialEq)]
pub enum KeyConflict {
    /// A prefix of the path already holds a leaf value.
    /// Example: adding "button.submit" when "button" is a string.
    LeafInPath {
        key_path: String,
        existing_value: String,
    },
    /// The path itself holds nested keys.
    BranchAtPath { key_path: String },
}

impl fmt::Display for KeyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyConflict::LeafInPath {
                key_path,
                existing_value,
            } => write!(
                f,
                "cannot create nested key under '{}': existing value is {} (not an object)",
                key_path, existing_value
            ),
            KeyConflict::BranchAtPath { key_path } => write!(
                f,
                "cannot set a value at '{}': path contains nested keys",
                key_path
            ),
        }
    }
}

/// Outcome of [`Dictionary::insert_leaf`]
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Added,
    Existed,
    Conflict(KeyConflict),
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; nested objects become branches.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .map(|(key, value)| {
                let node = match value {
                    Value::Object(nested) => DictionaryNode::Branch(Dictionary::from_map(nested)),
                    other => DictionaryNode::Leaf(other.clone()),
                };
                (key.clone(), node)
            })
            .collect();
        Self { entries }
    }

    /// Convert back to a JSON value (keys come out sorted).
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, node) in &self.entries {
            let value = match node {
                DictionaryNode::Leaf(v) => v.clone(),
                DictionaryNode::Branch(nested) => nested.to_value(),
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, segment: &str) -> Option<&DictionaryNode> {
        self.entries.get(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DictionaryNode)> {
        self.entries.iter()
    }

    /// Resolve a dotted path.
    pub fn get_path(&self, path: &str) -> Option<&DictionaryNode> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut node = self.entries.get(first)?;
        for segment in segments {
            match node {
                DictionaryNode::Branch(nested) => node = nested.entries.get(segment)?,
                DictionaryNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Flatten to dotted paths. Pure; the tree is left untouched.
    pub fn flatten(&self) -> FlattenedDictionary {
        let mut flat = FlattenedDictionary::new();
        self.flatten_into("", &mut flat);
        flat
    }

    fn flatten_into(&self, prefix: &str, out: &mut FlattenedDictionary) {
        for (key, node) in &self.entries {
            let path = join_path(prefix, key);
            match node {
                DictionaryNode::Leaf(value) => {
                    out.insert(path, leaf_text(value));
                }
                DictionaryNode::Branch(nested) => nested.flatten_into(&path, out),
            }
        }
    }

    /// Inverse of [`Dictionary::flatten`] for maps where no key is a strict prefix of another.
    /// Entries that would conflict with an earlier one are dropped.
    pub fn unflatten(flat: &FlattenedDictionary) -> Self {
        let mut dict = Dictionary::new();
        for (path, value) in flat {
            let _ = dict.insert_leaf(path, Value::String(value.clone()));
        }
        dict
    }

    /// Every leaf path under this tree, in tree order.
    pub fn leaf_paths(&self, prefix: &str) -> Vec<String> {
        let mut paths = Vec::new();
        for (key, node) in &self.entries {
            let path = join_path(prefix, key);
            match node {
                DictionaryNode::Leaf(_) => paths.push(path),
                DictionaryNode::Branch(nested) => paths.extend(nested.leaf_paths(&path)),
            }
        }
        paths
    }

    /// Set a leaf at a dotted path, creating intermediate branches.
    /// An existing leaf is never overwritten and a conflicting shape is never replaced.
    pub fn insert_leaf(&mut self, path: &str, value: Value) -> InsertOutcome {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return InsertOutcome::Conflict(KeyConflict::BranchAtPath {
                key_path: path.to_string(),
            });
        }

        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;
            if is_last {
                return match current.entries.entry((*segment).to_string()) {
                    Entry::Vacant(slot) => {
                        slot.insert(DictionaryNode::Leaf(value));
                        InsertOutcome::Added
                    }
                    Entry::Occupied(existing) => match existing.get() {
                        DictionaryNode::Leaf(_) => InsertOutcome::Existed,
                        DictionaryNode::Branch(_) => {
                            InsertOutcome::Conflict(KeyConflict::BranchAtPath {
                                key_path: path.to_string(),
                            })
                        }
                    },
                };
            }

            let node = current
                .entries
                .entry((*segment).to_string())
                .or_insert_with(|| DictionaryNode::Branch(Dictionary::new()));
            match node {
                DictionaryNode::Branch(nested) => current = nested,
                DictionaryNode::Leaf(existing) => {
                    return InsertOutcome::Conflict(KeyConflict::LeafInPath {
                        key_path: segments[..=i].join("."),
                        existing_value: existing.to_string(),
                    });
                }
            }
        }
        InsertOutcome::Existed
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Text of a leaf as seen by the checkers. Arrays and scalars render as JSON.
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Formatting detected from an existing locale file, reused on write-back.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonStyle {
    pub indent: String,
    pub use_crlf: bool,
    pub trailing_newline: bool,
}

impl Default for JsonStyle {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            use_crlf: false,
            trailing_newline: true,
        }
    }
}

/// Detect indentation and line endings from file content
pub fn detect_json_style(content: &str) -> JsonStyle {
    let mut style = JsonStyle {
        use_crlf: content.contains("\r\n"),
        trailing_newline: content.ends_with('\n'),
        ..JsonStyle::default()
    };

    // The first line that starts with a key or a closing bracket shows the indent unit.
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed == "{" || trimmed == "[" {
            continue;
        }
        if trimmed.starts_with('"') || trimmed.starts_with('}') || trimmed.starts_with(']') {
            let indent_len = line.len() - trimmed.len();
            if indent_len > 0 {
                style.indent = line[..indent_len].to_string();
                break;
            }
        }
    }

    style
}

/// Serialize a dictionary with the given style
pub fn render_dictionary(dict: &Dictionary, style: &JsonStyle) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(style.indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    dict.to_value().serialize(&mut serializer)?;

    let mut rendered = String::from_utf8(buffer)?;
    if style.trailing_newline {
        rendered.push('\n');
    }
    if style.use_crlf {
        rendered = rendered.replace('\n', "\r\n");
    }
    Ok(rendered)
}

/// Parse locale file content into a dictionary
pub fn parse_dictionary(content: &str, format: LocaleFormat, path: &Path) -> LoadResult<Dictionary> {
    if content.trim().is_empty() {
        return Ok(Dictionary::new());
    }

    let value: Value = match format {
        LocaleFormat::Json => serde_json::from_str(content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?,
        LocaleFormat::Json5 => json5::from_str(content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?,
    };

    match value {
        Value::Object(map) => Ok(Dictionary::from_map(&map)),
        _ => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads and writes `<dir>/<language>.<ext>` locale files.
pub struct DictionaryLoader<'a, F: FileSystem> {
    fs: &'a F,
    dir: PathBuf,
    format: LocaleFormat,
}

impl<'a, F: FileSystem> DictionaryLoader<'a, F> {
    pub fn new(fs: &'a F, dir: impl Into<PathBuf>, format: LocaleFormat) -> Self {
        Self {
            fs,
            dir: dir.into(),
            format,
        }
    }

    pub fn path_for(&self, language: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", language, self.format.extension()))
    }

    /// Load a language's dictionary. A missing file is an error, not an empty dictionary.
    pub fn load(&self, language: &str) -> LoadResult<Dictionary> {
        let path = self.path_for(language);
        if !self.fs.is_file(&path) {
            return Err(LoadError::Missing {
                language: language.to_string(),
                path,
            });
        }

        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| LoadError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        parse_dictionary(&content, self.format, &path)
    }

    /// Write a dictionary back, keeping the existing file's indentation and line endings.
    pub fn save(&self, language: &str, dict: &Dictionary) -> Result<PathBuf> {
        let path = self.path_for(language);
        self.fs
            .create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        self.fs.with_exclusive_lock(&path, || {
            let style = if self.fs.is_file(&path) {
                let existing = self
                    .fs
                    .read_to_string(&path)
                    .with_context(|| format!("Failed to read existing file: {}", path.display()))?;
                detect_json_style(&existing)
            } else {
                JsonStyle::default()
            };
            let rendered = render_dictionary(dict, &style)?;
            self.fs
                .atomic_write(&path, rendered.as_bytes())
                .with_context(|| format!("Failed to write locale file: {}", path.display()))
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::InMemoryFileSystem;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dict(value: Value) -> Dictionary {
        match value {
            Value::Object(map) => Dictionary::from_map(&map),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn flatten_joins_segments_with_dots() {
        let d = dict(json!({
            "community": { "stats": { "groups": "Groups", "members": "Members" } },
            "common": { "save": "Save" }
        }));
        let flat = d.flatten();
        let keys: Vec<_> = flat.keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["common.save", "community.stats.groups", "community.stats.members"]
        );
        assert_eq!(flat["community.stats.groups"], "Groups");
    }

    #[test]
    fn arrays_are_leaves() {
        let d = dict(json!({ "steps": ["one", "two"], "count": 3 }));
        let flat = d.flatten();
        assert_eq!(flat["steps"], r#"["one","two"]"#);
        assert_eq!(flat["count"], "3");
        assert!(!flat.contains_key("steps.0"));
    }

    #[test]
    fn flatten_unflatten_round_trip() {
        let mut flat = FlattenedDictionary::new();
        flat.insert("a.b".to_string(), "x".to_string());
        flat.insert("a.c.d".to_string(), "y".to_string());
        flat.insert("e".to_string(), "".to_string());

        assert_eq!(Dictionary::unflatten(&flat).flatten(), flat);
    }

    #[test]
    fn insert_leaf_creates_intermediate_branches() {
        let mut d = Dictionary::new();
        assert_eq!(
            d.insert_leaf("symbols.detail.title", json!("Title")),
            InsertOutcome::Added
        );
        assert!(d.get("symbols").map(DictionaryNode::is_branch).unwrap_or(false));
        assert_eq!(
            d.get_path("symbols.detail.title"),
            Some(&DictionaryNode::text("Title"))
        );
    }

    #[test]
    fn insert_leaf_never_overwrites() {
        let mut d = dict(json!({ "button": "Click", "nav": { "home": "Home" } }));

        assert_eq!(d.insert_leaf("button", json!("Other")), InsertOutcome::Existed);
        assert!(matches!(
            d.insert_leaf("button.submit", json!("Submit")),
            InsertOutcome::Conflict(KeyConflict::LeafInPath { .. })
        ));
        assert!(matches!(
            d.insert_leaf("nav", json!("Nav")),
            InsertOutcome::Conflict(KeyConflict::BranchAtPath { .. })
        ));
        assert_eq!(d.get_path("button"), Some(&DictionaryNode::text("Click")));
    }

    #[test]
    fn loader_reports_missing_and_invalid_files() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("locales/en.json", r#"{ "a": "b" }"#);
        fs.add_file("locales/fr.json", "[1, 2]");
        fs.add_file("locales/de.json", "{ not json");
        let loader = DictionaryLoader::new(&fs, "locales", LocaleFormat::Json);

        assert_eq!(loader.load("en").unwrap().flatten()["a"], "b");
        assert!(matches!(loader.load("it"), Err(LoadError::Missing { .. })));
        assert!(matches!(loader.load("fr"), Err(LoadError::NotAnObject { .. })));
        assert!(matches!(loader.load("de"), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn loader_reads_json5() {
        let fs = InMemoryFileSystem::new();
        fs.add_file(
            "locales/fr.json5",
            "{\n  // commentaire\n  common: { save: 'Enregistrer', },\n}\n",
        );
        let loader = DictionaryLoader::new(&fs, "locales", LocaleFormat::Json5);
        assert_eq!(loader.load("fr").unwrap().flatten()["common.save"], "Enregistrer");
    }

    #[test]
    fn save_preserves_detected_style() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("locales/fr.json", "{\n    \"b\": \"2\"\n}\n");
        let loader = DictionaryLoader::new(&fs, "locales", LocaleFormat::Json);

        let mut d = loader.load("fr").unwrap();
        d.insert_leaf("a", json!("1"));
        loader.save("fr", &d).unwrap();

        assert_eq!(
            fs.contents("locales/fr.json").unwrap(),
            "{\n    \"a\": \"1\",\n    \"b\": \"2\"\n}\n"
        );
    }

    #[test]
    fn detect_style_handles_tabs_and_crlf() {
        let style = detect_json_style("{\r\n\t\"a\": \"b\"\r\n}\r\n");
        assert_eq!(style.indent, "\t");
        assert!(style.use_crlf);
        assert!(style.trailing_newline);
    }
}
