use anyhow::{bail, Result};

use crate::config::Config;
use crate::dictionary::DictionaryLoader;
use crate::fixer::{apply_missing_key_fixes, write_fixed_dictionaries, FixAction};
use crate::fs::RealFileSystem;
use crate::validator::{run_validation, ValidateOptions};

pub fn run(config: &Config, dry_run: bool) -> Result<()> {
    println!("=== i18n-guard fix ===\n");

    let fs = RealFileSystem;
    let mut run = run_validation(config, &fs, ValidateOptions::default())?;
    let missing = &run.report.missing;

    if missing.is_empty() {
        println!("No missing keys. Nothing to fix.");
        return Ok(());
    }

    let records = apply_missing_key_fixes(missing, &mut run.primary, &mut run.secondary);
    let prefix = if dry_run { "[dry-run] " } else { "" };
    for record in &records {
        match &record.action {
            FixAction::AddedPlaceholder => {
                println!("  {}+ {} ({})", prefix, record.key, record.language)
            }
            FixAction::SkippedConflict(reason) => {
                println!("  {}! {} ({}): {}", prefix, record.key, record.language, reason)
            }
        }
    }

    if dry_run {
        let applied = records.iter().filter(|r| r.applied()).count();
        println!("\n[dry-run] Would add {} placeholder(s). No files written.", applied);
        return Ok(());
    }

    let loader = DictionaryLoader::new(&fs, config.locales_path(), config.locale_format);
    let outcome = write_fixed_dictionaries(
        &loader,
        records,
        &[
            (config.primary_language(), &run.primary),
            (config.secondary_language(), &run.secondary),
        ],
    );

    println!("\nAdded {} placeholder(s)", outcome.applied_count());
    for file in &outcome.written_files {
        println!("  Updated: {}", file);
    }

    if !outcome.errors.is_empty() {
        eprintln!("\nWrite errors:");
        for failure in &outcome.errors {
            eprintln!("  {}: {}", failure.path, failure.message);
        }
        bail!("{} file(s) could not be written", outcome.errors.len());
    }

    Ok(())
}
