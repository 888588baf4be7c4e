use std::fs;
use std::path::Path;

use i18n_guard::config::Config;
use i18n_guard::dictionary::DictionaryLoader;
use i18n_guard::differ::find_missing_keys;
use i18n_guard::fixer::{apply_missing_key_fixes, write_fixed_dictionaries};
use i18n_guard::format_check::FormatIssueKind;
use i18n_guard::fs::RealFileSystem;
use i18n_guard::report::{self, MarkdownGrouping};
use i18n_guard::validator::{run_validation, ValidateOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::tempdir;

fn write_json(path: &Path, value: Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn config_for(root: &Path) -> Config {
    Config {
        source_dir: root.join("src").display().to_string(),
        locales_dir: root.join("locales").display().to_string(),
        ..Config::default()
    }
}

#[test]
fn cancel_missing_in_french_only() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_json(
        &root.join("locales/en.json"),
        json!({ "common": { "save": "Save", "cancel": "Cancel" } }),
    );
    write_json(
        &root.join("locales/fr.json"),
        json!({ "common": { "save": "Enregistrer" } }),
    );

    let config = config_for(root);
    let run = run_validation(&config, &RealFileSystem, ValidateOptions::default()).unwrap();

    assert_eq!(
        run.report.missing.missing_in_secondary,
        vec!["common.cancel".to_string()]
    );
    assert!(run.report.missing.missing_in_primary.is_empty());
    assert!(!run.report.is_valid());
}

#[test]
fn fix_then_revalidate_is_clean_and_stable() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_json(
        &root.join("locales/en.json"),
        json!({ "hunt": { "steps": { "one": "Step one", "two": "Step two" } } }),
    );
    write_json(
        &root.join("locales/fr.json"),
        json!({ "hunt": "pas encore", "extra": { "note": "Remarque" } }),
    );
    let config = config_for(root);
    let fs = RealFileSystem;

    let mut run = run_validation(&config, &fs, ValidateOptions::default()).unwrap();
    // `hunt` is a string in fr, so neither side can be filled at that path.
    assert_eq!(
        run.report.missing.missing_in_secondary,
        vec!["hunt.steps.one".to_string(), "hunt.steps.two".to_string()]
    );
    assert_eq!(
        run.report.missing.missing_in_primary,
        vec!["extra.note".to_string(), "hunt".to_string()]
    );

    let records = apply_missing_key_fixes(&run.report.missing, &mut run.primary, &mut run.secondary);
    let loader = DictionaryLoader::new(&fs, config.locales_path(), config.locale_format);
    let outcome = write_fixed_dictionaries(
        &loader,
        records,
        &[("en", &run.primary), ("fr", &run.secondary)],
    );
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.applied_count(), 1);

    let en = loader.load("en").unwrap().flatten();
    assert_eq!(en["extra.note"], "[EN] Remarque");
    // Only the structural conflict is left.
    assert_eq!(
        find_missing_keys(&loader.load("fr").unwrap().flatten(), &en),
        vec!["hunt".to_string()]
    );

    let mut again = run_validation(&config, &fs, ValidateOptions::default()).unwrap();
    let second = apply_missing_key_fixes(&again.report.missing, &mut again.primary, &mut again.secondary);
    assert!(second.iter().all(|r| !r.applied()));
}

#[test]
fn source_scan_feeds_generic_suggestions_and_reports() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_json(
        &root.join("locales/en.json"),
        json!({ "community": { "intro": "{count} groups", "empty": "<b>None</b>" } }),
    );
    write_json(
        &root.join("locales/fr.json"),
        json!({ "community": { "intro": "{total} groupes", "empty": "Aucun" } }),
    );
    fs::create_dir_all(root.join("src/pages/Community")).unwrap();
    fs::write(
        root.join("src/pages/Community/Header.tsx"),
        "import React from 'react';\n\nconst CommunityHeader = () => (\n  <header>\n    <h1>{t('title')}</h1>\n    <p>{t('community.intro', { count })}</p>\n  </header>\n);\n",
    )
    .unwrap();

    let config = config_for(root);
    let run = run_validation(
        &config,
        &RealFileSystem,
        ValidateOptions {
            scan_source: true,
            scope: None,
        },
    )
    .unwrap();
    let report = &run.report;

    let kinds: Vec<_> = report.format_issues.iter().map(|i| (i.key.as_str(), i.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("community.empty", FormatIssueKind::HtmlTags),
            ("community.intro", FormatIssueKind::PlaceholderNames),
        ]
    );

    let source = report.source.as_ref().unwrap();
    assert_eq!(source.files_scanned, 1);
    assert_eq!(source.undefined_keys, vec!["title".to_string()]);
    assert_eq!(source.unused_keys, vec!["community.empty".to_string()]);
    assert_eq!(source.generic_suggestions.len(), 1);
    assert_eq!(
        source.generic_suggestions[0].suggested_key,
        "community.community-header.title"
    );
    assert_eq!(source.generic_suggestions[0].line, 5);
    assert_eq!(report.invalid_key_formats, vec!["title".to_string()]);

    let markdown = report::to_markdown(report, MarkdownGrouping::ByFile);
    assert!(markdown.contains("Header.tsx"));
    assert!(markdown.contains("community.community-header.title"));

    let summary: Value = serde_json::from_str(&report::to_json(report).unwrap()).unwrap();
    assert_eq!(summary["format_issues_count"], 2);
    assert_eq!(summary["invalid_key_format_count"], 1);
    assert_eq!(summary["valid"], false);
}
