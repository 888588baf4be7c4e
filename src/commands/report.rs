use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::commands::{should_scan_source, write_output_file};
use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::report::{self, MarkdownGrouping, SUCCESS_MARK};
use crate::validator::{run_validation, ValidateOptions};

/// Write every configured report file.
pub fn run(config: &Config, scope: Option<&Path>, group_by_file: bool) -> Result<()> {
    println!("=== i18n-guard report ===\n");

    let options = ValidateOptions {
        scan_source: should_scan_source(config, scope),
        scope,
    };
    let run = run_validation(config, &RealFileSystem, options)?;
    let report = &run.report;
    let (primary, secondary) = run.flattened();
    let grouping = if group_by_file {
        MarkdownGrouping::ByFile
    } else {
        MarkdownGrouping::ByCategory
    };

    let (suggestions, migration) = match &report.source {
        Some(source) => (source.generic_suggestions.as_slice(), source.migration.as_slice()),
        None => (&[][..], &[][..]),
    };

    let outputs: Vec<(PathBuf, String)> = vec![
        (
            PathBuf::from(&config.reports.markdown),
            report::to_markdown(report, grouping),
        ),
        (PathBuf::from(&config.reports.json), report::to_json(report)?),
        (
            PathBuf::from(&config.reports.missing_csv),
            report::missing_keys_csv(report, &primary, &secondary),
        ),
        (
            PathBuf::from(&config.reports.generic_csv),
            report::generic_keys_csv(suggestions),
        ),
        (
            PathBuf::from(&config.reports.migration_csv),
            report::migration_csv(migration),
        ),
    ];

    for (path, content) in &outputs {
        write_output_file(path, content)?;
        println!("{} Wrote {}", SUCCESS_MARK.green(), path.display());
    }

    println!("\n{}", report.summary_line());
    Ok(())
}
