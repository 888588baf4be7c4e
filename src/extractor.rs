use anyhow::{Context, Result};
use glob::Pattern;
use rayon::prelude::*;
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};
use walkdir::WalkDir;

use crate::config::Config;
use crate::fs::{FileSystem, RealFileSystem};
use crate::logging;

/// Normalize a key to NFC so visually identical keys compare equal.
/// Already-normalized keys (the common case) are returned without allocating.
fn normalize_key(key: &str) -> Cow<'_, str> {
    match is_nfc_quick(key.chars()) {
        IsNormalized::Yes => Cow::Borrowed(key),
        _ => Cow::Owned(key.nfc().collect()),
    }
}

/// Which call-site shape produced an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSite {
    /// `<Text translationKey="key" />`
    JsxAttribute,
    /// `t('key')`
    Call,
    /// `t('key', { count })`
    CallWithArgs,
    /// `i18n.t('key')`
    Chained,
}

/// One textual use of a translation key in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub key: String,
    pub file: String,
    /// 1-based
    pub line: usize,
    /// Byte offset of the key literal's opening quote within its line
    pub column: usize,
    /// The trimmed source line
    pub context: String,
    pub call_site: CallSite,
}

/// Error encountered while reading a source file
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionError {
    pub file_path: String,
    pub message: String,
}

/// Result of scanning a source tree
#[derive(Debug, Default, Serialize)]
pub struct ExtractionResult {
    /// Sorted, deduplicated
    pub keys: Vec<String>,
    /// Every match, in file then position order
    pub occurrences: Vec<Occurrence>,
    pub files_scanned: usize,
    pub errors: Vec<ExtractionError>,
}

impl ExtractionResult {
    pub fn occurrences_in<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a Occurrence> {
        self.occurrences.iter().filter(move |o| o.file == file)
    }
}

/// A string literal in any of the three JS quote styles. Template literals with
/// `${` interpolation are not keys.
const QUOTED_KEY: &str = r#"(?:'([^'\n]+)'|"([^"\n]+)"|`([^`$\n]+)`)"#;

/// Compiled call-site patterns, in match order.
pub struct KeyPatterns {
    patterns: Vec<(CallSite, Regex)>,
}

impl KeyPatterns {
    pub fn new(functions: &[String], jsx_attributes: &[String]) -> Result<Self> {
        let mut patterns = Vec::new();

        if !jsx_attributes.is_empty() {
            let attrs = alternation(jsx_attributes);
            let source = format!(r#"\b(?:{})\s*=\s*(?:\{{\s*)?{}"#, attrs, QUOTED_KEY);
            patterns.push((CallSite::JsxAttribute, compile(&source)?));
        }

        if !functions.is_empty() {
            let funcs = alternation(functions);
            // Plain calls must not be preceded by an identifier char, `.` or `$`,
            // so member calls only match the chained pattern.
            let plain = format!(r#"(?:^|[^\w.$])(?:{})\s*\(\s*{}"#, funcs, QUOTED_KEY);
            patterns.push((CallSite::Call, compile(&format!(r"{}\s*\)", plain))?));
            patterns.push((CallSite::CallWithArgs, compile(&format!(r"{}\s*,", plain))?));
            // `i18n.t(`, `props.t(` and the optional-chained `i18n?.t(`.
            let chained = format!(r#"[\w$)\]]\s*\??\.\s*(?:{})\s*\(\s*{}"#, funcs, QUOTED_KEY);
            patterns.push((CallSite::Chained, compile(&chained)?));
        }

        Ok(Self { patterns })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.functions, &config.jsx_attributes)
    }

    /// Find every key occurrence in `source`.
    pub fn scan(&self, source: &str, file: &str) -> Vec<Occurrence> {
        let lines: Vec<&str> = source.lines().collect();
        let mut found: Vec<(usize, Occurrence)> = Vec::new();

        for (call_site, regex) in &self.patterns {
            for caps in regex.captures_iter(source) {
                let Some(key_match) = quoted_group(&caps) else {
                    continue;
                };
                let key = key_match.as_str().trim();
                if key.is_empty() {
                    continue;
                }
                let offset = key_match.start();
                let line = line_number_at(source, offset);
                // The opening quote is the byte just before the key.
                let quote = offset - 1;
                let line_start = source[..quote].rfind('\n').map_or(0, |i| i + 1);
                let context = lines
                    .get(line - 1)
                    .map(|l| l.trim().to_string())
                    .unwrap_or_default();
                found.push((
                    offset,
                    Occurrence {
                        key: normalize_key(key).into_owned(),
                        file: file.to_string(),
                        line,
                        column: quote - line_start,
                        context,
                        call_site: *call_site,
                    },
                ));
            }
        }

        found.sort_by_key(|(offset, occ)| (*offset, occ.call_site));
        found.into_iter().map(|(_, occ)| occ).collect()
    }
}

fn alternation(names: &[String]) -> String {
    names
        .iter()
        .map(|n| regex::escape(n.trim()))
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(source: &str) -> Result<Regex> {
    Regex::new(source).with_context(|| format!("Invalid key pattern: {}", source))
}

fn quoted_group<'h>(caps: &Captures<'h>) -> Option<regex::Match<'h>> {
    caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))
}

/// 1-based line of a byte offset: newlines before it, plus one.
pub fn line_number_at(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Locate source files: `root` itself when it is a file, otherwise every file
/// below it with a matching extension that no ignore pattern excludes.
pub fn discover_files(root: &Path, extensions: &[String], ignore: &[String]) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        anyhow::bail!("Source path does not exist: {}", root.display());
    }

    let ignore_patterns = ignore
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern: {}", p)))
        .collect::<Result<Vec<_>>>()?;

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                logging::warn(&format!("Skipping unreadable entry: {}", e));
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            !ignore_patterns
                .iter()
                .any(|p| p.matches_path(relative) || p.matches_path(path))
        })
        .collect();

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

enum FileScan {
    Scanned(Vec<Occurrence>),
    Failed(ExtractionError),
}

/// Scan a list of files in parallel. Unreadable files are logged and skipped.
pub fn extract_from_files<F: FileSystem>(
    files: &[PathBuf],
    patterns: &KeyPatterns,
    fs: &F,
) -> ExtractionResult {
    let scans: Vec<FileScan> = files
        .par_iter()
        .map(|path| {
            let display = path.display().to_string();
            match fs.read_to_string(path) {
                Ok(source) => FileScan::Scanned(patterns.scan(&source, &display)),
                Err(e) => FileScan::Failed(ExtractionError {
                    file_path: display,
                    message: e.to_string(),
                }),
            }
        })
        .collect();

    let mut result = ExtractionResult::default();
    let mut keys = BTreeSet::new();

    for scan in scans {
        match scan {
            FileScan::Scanned(occurrences) => {
                result.files_scanned += 1;
                for occ in &occurrences {
                    keys.insert(occ.key.clone());
                }
                result.occurrences.extend(occurrences);
            }
            FileScan::Failed(err) => {
                logging::warn(&format!("Skipping {}: {}", err.file_path, err.message));
                result.errors.push(err);
            }
        }
    }

    result.keys = keys.into_iter().collect();
    result
}

/// Scan the configured source tree, or `scope` when given.
pub fn extract(config: &Config, scope: Option<&Path>) -> Result<ExtractionResult> {
    let root = scope
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.source_root());
    let files = discover_files(&root, &config.extensions, &config.ignore)?;
    logging::debug(&format!(
        "Scanning {} file(s) under {}",
        files.len(),
        root.display()
    ));
    let patterns = KeyPatterns::from_config(config)?;
    Ok(extract_from_files(&files, &patterns, &RealFileSystem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::InMemoryFileSystem;
    use pretty_assertions::assert_eq;

    fn patterns() -> KeyPatterns {
        let config = Config::default();
        KeyPatterns::from_config(&config).unwrap()
    }

    fn keys_of(occurrences: &[Occurrence]) -> Vec<(&str, usize, CallSite)> {
        occurrences
            .iter()
            .map(|o| (o.key.as_str(), o.line, o.call_site))
            .collect()
    }

    #[test]
    fn recognizes_all_call_site_shapes() {
        let source = r#"import { t } from 'i18n';
<I18nText translationKey="community.header.title" />
const label = t('symbols.list.empty');
const count = t("symbols.list.count", { count: 3 });
const other = i18n.t(`collections.detail.heading`);
<Trans i18nKey={'hunt.intro'} />
const optional = i18n?.t('hunt.steps.optional');
"#;
        let occurrences = patterns().scan(source, "a.tsx");
        assert_eq!(
            keys_of(&occurrences),
            vec![
                ("community.header.title", 2, CallSite::JsxAttribute),
                ("symbols.list.empty", 3, CallSite::Call),
                ("symbols.list.count", 4, CallSite::CallWithArgs),
                ("collections.detail.heading", 5, CallSite::Chained),
                ("hunt.intro", 6, CallSite::JsxAttribute),
                ("hunt.steps.optional", 7, CallSite::Chained),
            ]
        );
    }

    #[test]
    fn column_points_at_the_opening_quote() {
        let source = "import x;\n<Input name=\"title\" placeholder={t('title')} />\n";
        let occurrences = patterns().scan(source, "a.tsx");
        assert_eq!(occurrences.len(), 1);
        let line = source.lines().nth(1).unwrap();
        assert_eq!(occurrences[0].column, line.find("'title'").unwrap());
    }

    #[test]
    fn ignores_dynamic_and_lookalike_calls() {
        let source = "t(`dynamic.${id}`);\nformat('not.a.key');\nget('x');\nt(variable);";
        assert!(patterns().scan(source, "a.ts").is_empty());
    }

    #[test]
    fn call_at_start_of_file_is_found() {
        let occurrences = patterns().scan("t('first.key')", "a.ts");
        assert_eq!(keys_of(&occurrences), vec![("first.key", 1, CallSite::Call)]);
    }

    #[test]
    fn line_numbers_count_preceding_newlines() {
        let source = "a\nb\nc";
        assert_eq!(line_number_at(source, 0), 1);
        assert_eq!(line_number_at(source, 2), 2);
        assert_eq!(line_number_at(source, 4), 3);
    }

    #[test]
    fn keys_are_deduplicated_but_occurrences_kept() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("src/a.tsx", "t('common.save');\nt('common.save');");
        fs.add_file("src/b.tsx", "<Button translationKey=\"common.save\" />");

        let files = vec![PathBuf::from("src/a.tsx"), PathBuf::from("src/b.tsx")];
        let result = extract_from_files(&files, &patterns(), &fs);

        assert_eq!(result.keys, vec!["common.save".to_string()]);
        assert_eq!(result.occurrences.len(), 3);
        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.occurrences_in("src/a.tsx").count(), 2);
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("src/ok.ts", "t('ok.key')");

        let files = vec![PathBuf::from("src/missing.ts"), PathBuf::from("src/ok.ts")];
        let result = extract_from_files(&files, &patterns(), &fs);

        assert_eq!(result.keys, vec!["ok.key".to_string()]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file_path, "src/missing.ts");
    }

    #[test]
    fn discovers_files_by_extension_and_ignore() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        std::fs::write(root.join("pages/Home.tsx"), "").unwrap();
        std::fs::write(root.join("pages/styles.css"), "").unwrap();
        std::fs::write(root.join("node_modules/lib/index.js"), "").unwrap();

        let files = discover_files(
            root,
            &["tsx".to_string(), "js".to_string()],
            &["node_modules/**".to_string()],
        )
        .unwrap();
        assert_eq!(files, vec![root.join("pages/Home.tsx")]);
    }

    #[test]
    fn keys_are_nfc_normalized() {
        let decomposed = "t('cafe\u{301}.title')";
        let occurrences = patterns().scan(decomposed, "a.ts");
        assert_eq!(occurrences[0].key, "caf\u{e9}.title");
    }
}
