use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;
use crate::extractor;
use crate::fs::RealFileSystem;
use crate::generic_keys::{apply_suggestions, suggest_all, GenericKeyFinder};

pub fn run(config: &Config, scope: Option<&Path>, apply: bool, dry_run: bool) -> Result<()> {
    println!("=== i18n-guard generic-keys ===\n");

    let fs = RealFileSystem;
    let extraction = extractor::extract(config, scope)?;
    let finder = GenericKeyFinder::new(&config.generic_keys);
    let generic = finder.find_generic_key_usage(&extraction);

    if generic.is_empty() {
        println!("No generic keys found in {} file(s).", extraction.files_scanned);
        return Ok(());
    }

    let suggestions = suggest_all(&generic, &fs);
    println!("Generic keys ({}):", suggestions.len());
    println!("{}", "-".repeat(60));
    for s in &suggestions {
        println!("\n{}:{}  '{}' -> '{}'", s.file, s.line, s.original_key, s.suggested_key);
        println!("  - {}", s.original_line.trim());
        println!("  + {}", s.replacement_line.trim());
    }
    println!("\n{}", "-".repeat(60));

    if !apply {
        println!("\nRun with --apply to rewrite these occurrences.");
        return Ok(());
    }

    if dry_run {
        let files: std::collections::BTreeSet<&str> =
            suggestions.iter().map(|s| s.file.as_str()).collect();
        println!(
            "\n[dry-run] Would rewrite {} occurrence(s) in {} file(s)",
            suggestions.len(),
            files.len()
        );
        return Ok(());
    }

    let outcome = apply_suggestions(&suggestions, &fs);
    println!(
        "\nRewrote {} occurrence(s) in {} file(s)",
        outcome.replacements,
        outcome.files_updated.len()
    );
    for file in &outcome.files_updated {
        println!("  Updated: {}", file);
    }

    if !outcome.errors.is_empty() {
        for failure in &outcome.errors {
            eprintln!("  {}: {}", failure.path, failure.message);
        }
        bail!("{} file(s) could not be updated", outcome.errors.len());
    }

    println!("\nRemember to add the new keys to both locale files.");
    Ok(())
}
