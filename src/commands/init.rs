use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::dictionary::DictionaryLoader;
use crate::fs::{FileSystem, RealFileSystem};

pub fn run(force: bool) -> Result<()> {
    println!("=== i18n-guard init ===\n");

    let fs = RealFileSystem;
    let config_path = Path::new(DEFAULT_CONFIG_FILE);

    if fs.exists(config_path) && !force {
        bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let config_str = serde_json::to_string_pretty(&config)?;
    fs.write(config_path, &format!("{}\n", config_str))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created configuration file: {}\n", config_path.display());
    println!("Configuration:");
    println!("  Source: {}", config.source_dir);
    println!("  Locales directory: {}", config.locales_dir);
    println!("  Languages: {:?}", config.languages);
    println!("  Functions: {:?}", config.functions);

    println!("\nCreating locale files...");
    let locales_dir = config.locales_path();
    fs.create_dir_all(&locales_dir)
        .with_context(|| format!("Failed to create directory: {}", locales_dir.display()))?;
    let loader = DictionaryLoader::new(&fs, &locales_dir, config.locale_format);
    for language in &config.languages {
        let path = loader.path_for(language);
        if !fs.exists(&path) {
            fs.write(&path, "{}\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("  Created: {}", path.display());
        }
    }

    println!("\nNext steps:");
    println!("  1. Run 'i18n-guard extract' to list the keys used in source");
    println!("  2. Run 'i18n-guard validate' to compare the locale files");
    println!("  3. Run 'i18n-guard fix' to add placeholders for missing keys");

    println!("\nDone!");
    Ok(())
}
