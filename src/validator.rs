//! Runs the whole pipeline: load both dictionaries, diff, check formats and key
//! names, and optionally cross-check the source tree.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Config;
use crate::dictionary::{Dictionary, DictionaryLoader, FlattenedDictionary};
use crate::differ::diff_dictionaries;
use crate::extractor::{self, ExtractionResult};
use crate::fixer::{apply_missing_key_fixes, write_fixed_dictionaries, FixOutcome};
use crate::format_check::find_format_issues;
use crate::fs::FileSystem;
use crate::generic_keys::{migration_progress, suggest_all, GenericKeyFinder};
use crate::key_format::find_invalid_keys;
use crate::logging;
use crate::report::{SourceFindings, ValidationReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions<'a> {
    /// Scan the source tree for undefined, unused and generic keys
    pub scan_source: bool,
    /// Limit the scan to this directory or file
    pub scope: Option<&'a Path>,
}

/// The report plus the dictionaries and source scan it was computed from, so a
/// fix pass can reuse them without reloading.
pub struct ValidationRun {
    pub report: ValidationReport,
    pub primary: Dictionary,
    pub secondary: Dictionary,
    pub extraction: Option<ExtractionResult>,
}

impl ValidationRun {
    pub fn flattened(&self) -> (FlattenedDictionary, FlattenedDictionary) {
        (self.primary.flatten(), self.secondary.flatten())
    }

    /// Recompute the report from the current dictionaries and the same source scan.
    pub fn reanalyze<F: FileSystem>(&mut self, config: &Config, fs: &F) {
        let mut report = analyze(config, &self.primary, &self.secondary, self.extraction.as_ref());
        attach_generic_suggestions(config, fs, self.extraction.as_ref(), &mut report);
        self.report = report;
    }
}

/// `100 * shared / union`, or 100 when both are empty.
pub fn completion_rate(primary: &FlattenedDictionary, secondary: &FlattenedDictionary) -> (usize, f64) {
    let union: BTreeSet<&String> = primary.keys().chain(secondary.keys()).collect();
    if union.is_empty() {
        return (0, 100.0);
    }
    let shared = primary.keys().filter(|k| secondary.contains_key(*k)).count();
    (union.len(), 100.0 * shared as f64 / union.len() as f64)
}

/// Dictionary-level checks. `extraction` adds the source cross-check; its
/// keys are also held to the naming convention.
pub fn analyze(
    config: &Config,
    primary: &Dictionary,
    secondary: &Dictionary,
    extraction: Option<&ExtractionResult>,
) -> ValidationReport {
    let primary_flat = primary.flatten();
    let secondary_flat = secondary.flatten();

    let missing = diff_dictionaries(
        config.primary_language(),
        primary,
        config.secondary_language(),
        secondary,
    );
    let format_issues = find_format_issues(&primary_flat, &secondary_flat);
    let (total_keys, completion_rate) = completion_rate(&primary_flat, &secondary_flat);

    let extracted = extraction.map(|e| e.keys.as_slice()).unwrap_or_default();
    let invalid_key_formats = find_invalid_keys(
        primary_flat
            .keys()
            .chain(secondary_flat.keys())
            .chain(extracted.iter()),
    );

    let source = extraction.map(|extraction| {
        let undefined_keys = extraction
            .keys
            .iter()
            .filter(|k| !primary_flat.contains_key(*k))
            .cloned()
            .collect();
        let used: BTreeSet<&String> = extraction.keys.iter().collect();
        let unused_keys = primary_flat
            .keys()
            .filter(|k| !used.contains(k))
            .cloned()
            .collect();
        let finder = GenericKeyFinder::new(&config.generic_keys);

        SourceFindings {
            files_scanned: extraction.files_scanned,
            keys_scanned: extraction.keys.len(),
            undefined_keys,
            unused_keys,
            generic_suggestions: Vec::new(),
            migration: migration_progress(extraction, &finder),
            extraction_errors: extraction.errors.clone(),
            occurrences: extraction.occurrences.clone(),
        }
    });

    ValidationReport {
        missing,
        format_issues,
        invalid_key_formats,
        total_keys,
        completion_rate,
        source,
        write_errors: Vec::new(),
    }
}

/// Load both dictionaries and validate them. A missing or malformed
/// dictionary aborts the run.
pub fn run_validation<F: FileSystem>(
    config: &Config,
    fs: &F,
    options: ValidateOptions<'_>,
) -> Result<ValidationRun> {
    let loader = DictionaryLoader::new(fs, config.locales_path(), config.locale_format);
    let primary = loader.load(config.primary_language())?;
    let secondary = loader.load(config.secondary_language())?;
    logging::debug(&format!(
        "Loaded {} and {}",
        loader.path_for(config.primary_language()).display(),
        loader.path_for(config.secondary_language()).display()
    ));

    let extraction = if options.scan_source {
        Some(extractor::extract(config, options.scope)?)
    } else {
        None
    };

    let mut report = analyze(config, &primary, &secondary, extraction.as_ref());
    attach_generic_suggestions(config, fs, extraction.as_ref(), &mut report);

    Ok(ValidationRun {
        report,
        primary,
        secondary,
        extraction,
    })
}

fn attach_generic_suggestions<F: FileSystem>(
    config: &Config,
    fs: &F,
    extraction: Option<&ExtractionResult>,
    report: &mut ValidationReport,
) {
    if let (Some(extraction), Some(source)) = (extraction, &mut report.source) {
        let finder = GenericKeyFinder::new(&config.generic_keys);
        let generic = finder.find_generic_key_usage(extraction);
        source.generic_suggestions = suggest_all(&generic, fs);
    }
}

/// Fill every missing key with a placeholder, write both dictionaries and
/// re-validate against what actually reached disk: a language whose write
/// failed is reloaded, and the failures stay on the report.
pub fn fix_and_revalidate<F: FileSystem>(
    config: &Config,
    fs: &F,
    run: &mut ValidationRun,
) -> Result<FixOutcome> {
    let records = apply_missing_key_fixes(&run.report.missing, &mut run.primary, &mut run.secondary);
    let loader = DictionaryLoader::new(fs, config.locales_path(), config.locale_format);
    let outcome = write_fixed_dictionaries(
        &loader,
        records,
        &[
            (config.primary_language(), &run.primary),
            (config.secondary_language(), &run.secondary),
        ],
    );

    let write_failed = |language: &str| {
        let path = loader.path_for(language).display().to_string();
        outcome.errors.iter().any(|f| f.path == path)
    };
    if write_failed(config.primary_language()) {
        run.primary = loader.load(config.primary_language())?;
    }
    if write_failed(config.secondary_language()) {
        run.secondary = loader.load(config.secondary_language())?;
    }

    run.reanalyze(config, fs);
    run.report.write_errors = outcome.errors.clone();
    Ok(outcome)
}
