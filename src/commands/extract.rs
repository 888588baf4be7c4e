use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::extractor;

pub fn run(config: &Config, scope: Option<&Path>, json: bool) -> Result<()> {
    let extraction = extractor::extract(config, scope)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    println!("=== i18n-guard extract ===\n");
    println!("Configuration:");
    println!(
        "  Source: {}",
        scope
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| config.source_dir.clone())
    );
    println!("  Extensions: {:?}", config.extensions);
    println!("  Functions: {:?}", config.functions);
    println!("  JSX attributes: {:?}", config.jsx_attributes);
    println!();

    if !extraction.errors.is_empty() {
        eprintln!("Extraction errors:");
        for error in &extraction.errors {
            eprintln!("  {}: {}", error.file_path, error.message);
        }
        eprintln!();
    }

    if extraction.occurrences.is_empty() {
        println!("No translation keys found.");
        return Ok(());
    }

    println!("Extracted keys by file:");
    println!("{}", "-".repeat(60));

    let mut current_file: Option<&str> = None;
    for occ in &extraction.occurrences {
        if current_file != Some(occ.file.as_str()) {
            println!("\n{}", occ.file);
            current_file = Some(occ.file.as_str());
        }
        println!("  {:>5}: {}", occ.line, occ.key);
    }

    println!("\n{}", "-".repeat(60));
    println!("\nExtraction Summary:");
    println!("  Files scanned: {}", extraction.files_scanned);
    println!("  Occurrences: {}", extraction.occurrences.len());
    println!("  Unique keys found: {}", extraction.keys.len());
    if !extraction.errors.is_empty() {
        println!("  Skipped files: {}", extraction.errors.len());
    }

    Ok(())
}
