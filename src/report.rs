//! One canonical [`ValidationReport`] and the serializers rendering it:
//! console, Markdown, CSV exports and the JSON summary object.

use colored::Colorize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::dictionary::FlattenedDictionary;
use crate::differ::MissingKeys;
use crate::extractor::{ExtractionError, Occurrence};
use crate::fixer::WriteFailure;
use crate::format_check::FormatIssue;
use crate::generic_keys::{FixSuggestion, MigrationEntry};

/// Success mark for consistent output formatting
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓
/// Failure mark for consistent output formatting
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Findings that need the source tree, absent when only dictionaries were checked
#[derive(Debug, Default, Clone)]
pub struct SourceFindings {
    pub files_scanned: usize,
    pub keys_scanned: usize,
    /// Used in source, absent from the primary dictionary
    pub undefined_keys: Vec<String>,
    /// In the primary dictionary, never used in source
    pub unused_keys: Vec<String>,
    pub generic_suggestions: Vec<FixSuggestion>,
    pub migration: Vec<MigrationEntry>,
    pub extraction_errors: Vec<ExtractionError>,
    pub occurrences: Vec<Occurrence>,
}

impl SourceFindings {
    /// Files (sorted) where `key` is used
    fn files_using(&self, key: &str) -> BTreeSet<&str> {
        self.occurrences
            .iter()
            .filter(|o| o.key == key)
            .map(|o| o.file.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub missing: MissingKeys,
    pub format_issues: Vec<FormatIssue>,
    /// Advisory only
    pub invalid_key_formats: Vec<String>,
    /// Keys in either dictionary
    pub total_keys: usize,
    /// Percentage of `total_keys` present in both dictionaries
    pub completion_rate: f64,
    pub source: Option<SourceFindings>,
    /// Write-back failures from a fix pass, if one ran
    pub write_errors: Vec<WriteFailure>,
}

impl ValidationReport {
    /// Valid iff nothing is missing in either direction, no format issue
    /// exists and every fix reached disk. Key-format warnings never affect this.
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.format_issues.is_empty() && self.write_errors.is_empty()
    }

    pub fn primary_language(&self) -> &str {
        &self.missing.primary_language
    }

    pub fn secondary_language(&self) -> &str {
        &self.missing.secondary_language
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} missing key(s) ({}: {}, {}: {}), {} format issue(s), {} key format warning(s), {:.1}% complete",
            self.missing.total(),
            self.secondary_language(),
            self.missing.missing_in_secondary.len(),
            self.primary_language(),
            self.missing.missing_in_primary.len(),
            self.format_issues.len(),
            self.invalid_key_formats.len(),
            self.completion_rate
        );
        if let Some(source) = &self.source {
            let _ = write!(
                line,
                ", {} generic key use(s)",
                source.generic_suggestions.len()
            );
        }
        line
    }

    pub fn summary(&self) -> ValidationSummary<'_> {
        ValidationSummary { report: self }
    }

    fn details(&self) -> Value {
        let primary = self.primary_language();
        let secondary = self.secondary_language();
        let mut details = json!({
            (format!("missing_in_{}", secondary)): self.missing.missing_in_secondary,
            (format!("missing_in_{}", primary)): self.missing.missing_in_primary,
            "format_issues": self.format_issues,
            "invalid_key_formats": self.invalid_key_formats,
            "total_keys": self.total_keys,
            "completion_rate": round1(self.completion_rate),
        });

        if let (Some(source), Value::Object(map)) = (&self.source, &mut details) {
            map.insert("files_scanned".to_string(), json!(source.files_scanned));
            map.insert("keys_scanned".to_string(), json!(source.keys_scanned));
            map.insert("undefined_keys".to_string(), json!(source.undefined_keys));
            map.insert("unused_keys".to_string(), json!(source.unused_keys));
            map.insert(
                "generic_keys".to_string(),
                json!(source.generic_suggestions),
            );
            map.insert("migration".to_string(), json!(source.migration));
            map.insert(
                "extraction_errors".to_string(),
                json!(source.extraction_errors),
            );
        }
        if let Value::Object(map) = &mut details {
            if !self.write_errors.is_empty() {
                map.insert("write_errors".to_string(), json!(self.write_errors));
            }
        }
        details
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The flat summary object archived in validation history.
///
/// Missing counts are keyed by language: `missing_count_fr`, `missing_count_en`.
pub struct ValidationSummary<'a> {
    report: &'a ValidationReport,
}

impl Serialize for ValidationSummary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let report = self.report;
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry("valid", &report.is_valid())?;
        map.serialize_entry(
            &format!("missing_count_{}", report.secondary_language()),
            &report.missing.missing_in_secondary.len(),
        )?;
        map.serialize_entry(
            &format!("missing_count_{}", report.primary_language()),
            &report.missing.missing_in_primary.len(),
        )?;
        map.serialize_entry("format_issues_count", &report.format_issues.len())?;
        map.serialize_entry(
            "invalid_key_format_count",
            &report.invalid_key_formats.len(),
        )?;
        map.serialize_entry("summary", &report.summary_line())?;
        map.serialize_entry("details", &report.details())?;
        map.end()
    }
}

/// Pretty JSON of the summary object
pub fn to_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&report.summary())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkdownGrouping {
    #[default]
    ByCategory,
    ByFile,
}

/// Markdown rendering, grouped by issue category or by source file.
pub fn to_markdown(report: &ValidationReport, grouping: MarkdownGrouping) -> String {
    let mut out = String::new();
    let status = if report.is_valid() { "PASSED" } else { "FAILED" };

    let _ = writeln!(out, "# Translation validation report\n");
    let _ = writeln!(out, "**Status:** {}\n", status);
    let _ = writeln!(out, "{}\n", report.summary_line());
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| Total keys | {} |", report.total_keys);
    let _ = writeln!(out, "| Completion | {:.1}% |", report.completion_rate);
    let _ = writeln!(
        out,
        "| Missing in {} | {} |",
        report.secondary_language(),
        report.missing.missing_in_secondary.len()
    );
    let _ = writeln!(
        out,
        "| Missing in {} | {} |",
        report.primary_language(),
        report.missing.missing_in_primary.len()
    );
    let _ = writeln!(out, "| Format issues | {} |", report.format_issues.len());
    let _ = writeln!(
        out,
        "| Key format warnings | {} |",
        report.invalid_key_formats.len()
    );
    out.push('\n');

    match (grouping, &report.source) {
        (MarkdownGrouping::ByFile, Some(source)) => markdown_by_file(&mut out, report, source),
        _ => markdown_by_category(&mut out, report),
    }

    if !report.write_errors.is_empty() {
        let _ = writeln!(out, "## Write errors\n");
        for failure in &report.write_errors {
            let _ = writeln!(out, "- `{}`: {}", failure.path, failure.message);
        }
        out.push('\n');
    }

    out
}

fn markdown_key_list(out: &mut String, title: &str, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {} ({})\n", title, keys.len());
    for key in keys {
        let _ = writeln!(out, "- `{}`", key);
    }
    out.push('\n');
}

fn markdown_by_category(out: &mut String, report: &ValidationReport) {
    markdown_key_list(
        out,
        &format!("Missing in {}", report.secondary_language()),
        &report.missing.missing_in_secondary,
    );
    markdown_key_list(
        out,
        &format!("Missing in {}", report.primary_language()),
        &report.missing.missing_in_primary,
    );

    if !report.format_issues.is_empty() {
        let _ = writeln!(out, "## Format issues ({})\n", report.format_issues.len());
        let _ = writeln!(
            out,
            "| Key | Issue | {} | {} |",
            report.primary_language(),
            report.secondary_language()
        );
        let _ = writeln!(out, "| --- | --- | --- | --- |");
        for issue in &report.format_issues {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {} |",
                issue.key,
                issue.describe(report.primary_language(), report.secondary_language()),
                markdown_cell(&issue.primary_value),
                markdown_cell(&issue.secondary_value)
            );
        }
        out.push('\n');
    }

    markdown_key_list(out, "Key format warnings", &report.invalid_key_formats);

    let Some(source) = &report.source else {
        return;
    };
    markdown_key_list(out, "Used in source but undefined", &source.undefined_keys);
    markdown_key_list(out, "Defined but unused", &source.unused_keys);

    if !source.generic_suggestions.is_empty() {
        let _ = writeln!(
            out,
            "## Generic keys ({})\n",
            source.generic_suggestions.len()
        );
        let _ = writeln!(out, "| Location | Key | Suggestion |");
        let _ = writeln!(out, "| --- | --- | --- |");
        for s in &source.generic_suggestions {
            let _ = writeln!(
                out,
                "| {}:{} | `{}` | `{}` |",
                s.file, s.line, s.original_key, s.suggested_key
            );
        }
        out.push('\n');
    }

    if !source.migration.is_empty() {
        let pending = source
            .migration
            .iter()
            .filter(|m| m.generic_occurrences > 0)
            .count();
        let _ = writeln!(
            out,
            "## Migration progress ({}/{} files migrated)\n",
            source.migration.len() - pending,
            source.migration.len()
        );
        let _ = writeln!(out, "| File | Keys | Generic | Status |");
        let _ = writeln!(out, "| --- | --- | --- | --- |");
        for m in &source.migration {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                m.file,
                m.total_occurrences,
                m.generic_occurrences,
                m.status.as_str()
            );
        }
        out.push('\n');
    }
}

fn markdown_by_file(out: &mut String, report: &ValidationReport, source: &SourceFindings) {
    let mut by_file: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut unlocated: Vec<String> = Vec::new();

    let mut place = |key: &str, line: String| {
        let files = source.files_using(key);
        if files.is_empty() {
            unlocated.push(line);
        } else {
            for file in files {
                by_file.entry(file).or_default().push(line.clone());
            }
        }
    };

    for key in &report.missing.missing_in_secondary {
        place(key, format!("- `{}` missing in {}", key, report.secondary_language()));
    }
    for key in &report.missing.missing_in_primary {
        place(key, format!("- `{}` missing in {}", key, report.primary_language()));
    }
    for issue in &report.format_issues {
        place(
            &issue.key,
            format!(
                "- `{}`: {}",
                issue.key,
                issue.describe(report.primary_language(), report.secondary_language())
            ),
        );
    }
    for key in &report.invalid_key_formats {
        place(key, format!("- `{}` does not follow the key format", key));
    }
    for key in &source.undefined_keys {
        place(
            key,
            format!("- `{}` is not defined in {}", key, report.primary_language()),
        );
    }
    for s in &source.generic_suggestions {
        by_file.entry(s.file.as_str()).or_default().push(format!(
            "- line {}: generic key `{}`, suggest `{}`",
            s.line, s.original_key, s.suggested_key
        ));
    }

    for (file, lines) in &by_file {
        let _ = writeln!(out, "## {}\n", file);
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }

    if !unlocated.is_empty() {
        let _ = writeln!(out, "## Not referenced in source\n");
        for line in &unlocated {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `key,missing_in,reference_value`, one row per missing key
pub fn missing_keys_csv(
    report: &ValidationReport,
    primary: &FlattenedDictionary,
    secondary: &FlattenedDictionary,
) -> String {
    let mut out = String::from("key,missing_in,reference_value\n");
    let rows = report
        .missing
        .missing_in_secondary
        .iter()
        .map(|k| (k, report.secondary_language(), primary.get(k)))
        .chain(
            report
                .missing
                .missing_in_primary
                .iter()
                .map(|k| (k, report.primary_language(), secondary.get(k))),
        );
    for (key, language, reference) in rows {
        let _ = writeln!(
            out,
            "{},{},{}",
            csv_field(key),
            csv_field(language),
            csv_field(reference.map(String::as_str).unwrap_or_default())
        );
    }
    out
}

/// `file,line,original_key,suggested_key,replacement_line`
pub fn generic_keys_csv(suggestions: &[FixSuggestion]) -> String {
    let mut out = String::from("file,line,original_key,suggested_key,replacement_line\n");
    for s in suggestions {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            csv_field(&s.file),
            s.line,
            csv_field(&s.original_key),
            csv_field(&s.suggested_key),
            csv_field(s.replacement_line.trim())
        );
    }
    out
}

/// `file,total_occurrences,generic_occurrences,status`
pub fn migration_csv(entries: &[MigrationEntry]) -> String {
    let mut out = String::from("file,total_occurrences,generic_occurrences,status\n");
    for m in entries {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(&m.file),
            m.total_occurrences,
            m.generic_occurrences,
            m.status.as_str()
        );
    }
    out
}

fn print_key_list(title: &str, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    println!("\n{} ({})", title.bold(), keys.len());
    for key in keys {
        println!("  - {}", key);
    }
}

/// Console rendering.
pub fn print_console(report: &ValidationReport) {
    let primary = report.primary_language();
    let secondary = report.secondary_language();

    print_key_list(
        &format!("Missing in {}", secondary),
        &report.missing.missing_in_secondary,
    );
    print_key_list(
        &format!("Missing in {}", primary),
        &report.missing.missing_in_primary,
    );

    if !report.format_issues.is_empty() {
        println!("\n{} ({})", "Format issues".bold(), report.format_issues.len());
        for issue in &report.format_issues {
            println!(
                "  {}: \"{}\"  {}",
                "error".bold().red(),
                issue.key,
                issue.kind.as_str().dimmed().cyan()
            );
            println!("    {}", issue.describe(primary, secondary));
            println!("    {}: {}", primary, issue.primary_value);
            println!("    {}: {}", secondary, issue.secondary_value);
        }
    }

    if !report.invalid_key_formats.is_empty() {
        println!(
            "\n{} ({})",
            "Key format warnings".bold().yellow(),
            report.invalid_key_formats.len()
        );
        for key in &report.invalid_key_formats {
            println!("  {}: {}", "warning".yellow(), key);
        }
    }

    if let Some(source) = &report.source {
        println!(
            "\nScanned {} source file(s), {} distinct key(s)",
            source.files_scanned, source.keys_scanned
        );
        print_key_list("Used in source but undefined", &source.undefined_keys);
        print_key_list("Defined but unused", &source.unused_keys);
        if !source.generic_suggestions.is_empty() {
            println!(
                "\n{} ({})",
                "Generic keys".bold().yellow(),
                source.generic_suggestions.len()
            );
            for s in &source.generic_suggestions {
                println!(
                    "  {} {}:{}  '{}' -> '{}'",
                    "-->".blue(),
                    s.file,
                    s.line,
                    s.original_key,
                    s.suggested_key
                );
            }
        }
        for err in &source.extraction_errors {
            println!("  {}: {} ({})", "skipped".yellow(), err.file_path, err.message);
        }
    }

    for failure in &report.write_errors {
        println!(
            "  {}: could not write {}: {}",
            "error".bold().red(),
            failure.path,
            failure.message
        );
    }

    println!();
    if report.is_valid() {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Translations are consistent ({} keys, {:.1}% complete)",
                report.total_keys, report.completion_rate
            )
            .green()
        );
    } else {
        println!("{} {}", FAILURE_MARK.red(), report.summary_line().red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_check::check_pair;
    use crate::generic_keys::MigrationStatus;
    use pretty_assertions::assert_eq;

    fn report() -> ValidationReport {
        ValidationReport {
            missing: MissingKeys {
                primary_language: "en".to_string(),
                secondary_language: "fr".to_string(),
                missing_in_secondary: vec!["common.cancel".to_string()],
                missing_in_primary: vec![],
            },
            format_issues: vec![],
            invalid_key_formats: vec!["Title".to_string()],
            total_keys: 2,
            completion_rate: 50.0,
            source: None,
            write_errors: vec![],
        }
    }

    #[test]
    fn key_format_warnings_do_not_affect_validity() {
        let mut r = report();
        r.missing.missing_in_secondary.clear();
        assert!(r.is_valid());

        r.format_issues = check_pair("k", "{a}", "");
        assert!(!r.is_valid());
    }

    #[test]
    fn unwritten_fixes_make_the_run_invalid() {
        let mut r = report();
        r.missing.missing_in_secondary.clear();
        r.write_errors.push(WriteFailure {
            path: "locales/fr.json".to_string(),
            message: "permission denied".to_string(),
        });
        assert!(!r.is_valid());

        let value = serde_json::to_value(r.summary()).unwrap();
        assert_eq!(value["valid"], json!(false));
        assert_eq!(value["details"]["write_errors"][0]["path"], json!("locales/fr.json"));
    }

    #[test]
    fn summary_object_shape() {
        let value = serde_json::to_value(report().summary()).unwrap();
        assert_eq!(value["valid"], json!(false));
        assert_eq!(value["missing_count_fr"], json!(1));
        assert_eq!(value["missing_count_en"], json!(0));
        assert_eq!(value["format_issues_count"], json!(0));
        assert_eq!(value["invalid_key_format_count"], json!(1));
        assert_eq!(value["details"]["missing_in_fr"], json!(["common.cancel"]));
        assert_eq!(value["details"]["completion_rate"], json!(50.0));
        assert!(value["summary"].as_str().unwrap().contains("1 missing key(s)"));
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn missing_csv_carries_reference_text() {
        let primary = [("common.cancel".to_string(), "Cancel, now".to_string())]
            .into_iter()
            .collect();
        let csv = missing_keys_csv(&report(), &primary, &Default::default());
        assert_eq!(
            csv,
            "key,missing_in,reference_value\ncommon.cancel,fr,\"Cancel, now\"\n"
        );
    }

    #[test]
    fn migration_csv_rows() {
        let csv = migration_csv(&[MigrationEntry {
            file: "src/a.tsx".to_string(),
            total_occurrences: 3,
            generic_occurrences: 1,
            status: MigrationStatus::Pending,
        }]);
        assert_eq!(
            csv,
            "file,total_occurrences,generic_occurrences,status\nsrc/a.tsx,3,1,pending\n"
        );
    }

    #[test]
    fn markdown_by_file_falls_back_to_unlocated_section() {
        let mut r = report();
        r.source = Some(SourceFindings {
            occurrences: vec![Occurrence {
                key: "Title".to_string(),
                file: "src/pages/Home.tsx".to_string(),
                line: 3,
                column: 0,
                context: String::new(),
                call_site: crate::extractor::CallSite::Call,
            }],
            ..Default::default()
        });

        let md = to_markdown(&r, MarkdownGrouping::ByFile);
        assert!(md.contains("**Status:** FAILED"));
        assert!(md.contains("## src/pages/Home.tsx\n\n- `Title` does not follow the key format"));
        assert!(md.contains("## Not referenced in source\n\n- `common.cancel` missing in fr"));
    }

    #[test]
    fn markdown_by_category_lists_missing_keys() {
        let md = to_markdown(&report(), MarkdownGrouping::ByCategory);
        assert!(md.contains("## Missing in fr (1)\n\n- `common.cancel`"));
        assert!(!md.contains("Missing in en ("));
    }
}
