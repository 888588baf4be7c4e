use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;

use crate::commands::{should_scan_source, write_output_file};
use crate::config::Config;
use crate::fixer::apply_missing_key_fixes;
use crate::fs::RealFileSystem;
use crate::history;
use crate::logging;
use crate::report::{self, MarkdownGrouping, ValidationReport};
use crate::validator::{fix_and_revalidate, run_validation, ValidateOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
    Markdown,
    Csv,
}

#[derive(Debug, Clone, Default)]
pub struct ValidateArgs {
    pub scope: Option<PathBuf>,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub group_by_file: bool,
    pub fix: bool,
    pub dry_run: bool,
    pub no_history: bool,
}

/// Returns whether the translations passed; the caller maps this to the exit code.
pub fn run(config: &Config, args: &ValidateArgs) -> Result<bool> {
    let console = args.format == ReportFormat::Console;
    if console {
        println!("=== i18n-guard validate ===\n");
        println!("Configuration:");
        println!("  Languages: {}", config.languages.join(", "));
        println!("  Locales directory: {}", config.locales_dir);
        println!(
            "  Source: {}",
            args.scope
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| config.source_dir.clone())
        );
    }

    let fs = RealFileSystem;
    let scope = args.scope.as_deref();
    let options = ValidateOptions {
        scan_source: should_scan_source(config, scope),
        scope,
    };
    let mut run = run_validation(config, &fs, options)?;

    if args.fix && !run.report.missing.is_empty() {
        if args.dry_run {
            let mut preview_primary = run.primary.clone();
            let mut preview_secondary = run.secondary.clone();
            let records =
                apply_missing_key_fixes(&run.report.missing, &mut preview_primary, &mut preview_secondary);
            if console {
                let applied: Vec<_> = records.iter().filter(|r| r.applied()).collect();
                println!("\n[dry-run] Would add {} placeholder(s):", applied.len());
                for record in applied {
                    println!("  + {} ({})", record.key, record.language);
                }
            }
        } else {
            let outcome = fix_and_revalidate(config, &fs, &mut run)?;
            if console {
                println!("\nAdded {} placeholder(s)", outcome.applied_count());
                for file in &outcome.written_files {
                    println!("  Updated: {}", file);
                }
            }
        }
    }

    let report = &run.report;
    match args.format {
        ReportFormat::Console => {
            report::print_console(report);
            if let Some(output) = &args.output {
                write_output_file(output, &render_markdown(report, args.group_by_file))?;
                println!("\nReport written to {}", output.display());
            }
        }
        ReportFormat::Json => emit(args, &report::to_json(report)?)?,
        ReportFormat::Markdown => emit(args, &render_markdown(report, args.group_by_file))?,
        ReportFormat::Csv => {
            let (primary, secondary) = run.flattened();
            emit(args, &report::missing_keys_csv(report, &primary, &secondary))?
        }
    }

    if !args.no_history {
        let stores = history::stores_from_config(&config.history);
        history::record_summary(&stores, &report.summary());
    }

    if !report.write_errors.is_empty() {
        logging::error(&format!(
            "{} file(s) could not be written",
            report.write_errors.len()
        ));
    }
    Ok(report.is_valid())
}

fn render_markdown(report: &ValidationReport, group_by_file: bool) -> String {
    let grouping = if group_by_file {
        MarkdownGrouping::ByFile
    } else {
        MarkdownGrouping::ByCategory
    };
    report::to_markdown(report, grouping)
}

/// Machine-readable output goes to `--output` when given, stdout otherwise.
fn emit(args: &ValidateArgs, content: &str) -> Result<()> {
    match &args.output {
        Some(path) => {
            write_output_file(path, content)?;
            logging::info(&format!("Report written to {}", path.display()));
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}
