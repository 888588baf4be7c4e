use anyhow::Result;
use clap::{Parser, Subcommand};
use i18n_guard::commands;
use i18n_guard::commands::validate::{ReportFormat, ValidateArgs};
use i18n_guard::config::Config;
use i18n_guard::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "i18n-guard")]
#[command(author, version, about = "Translation key validation and reconciliation", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info or debug (overrides I18N_GUARD_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the two locale files and cross-check the source tree
    Validate {
        /// Limit the source scan to a directory or file
        #[arg(long)]
        scope: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Group Markdown output by source file
        #[arg(long)]
        group_by_file: bool,

        /// Add placeholders for missing keys
        #[arg(long)]
        fix: bool,

        /// With --fix, show what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Do not archive the summary in validation history
        #[arg(long)]
        no_history: bool,
    },

    /// List translation keys used in source files
    Extract {
        #[arg(long)]
        scope: Option<PathBuf>,

        /// Print the extraction result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find generic keys and suggest specific replacements
    GenericKeys {
        #[arg(long)]
        scope: Option<PathBuf>,

        /// Rewrite source files with the suggested keys
        #[arg(long)]
        apply: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Add placeholders for keys missing from either locale file
    Fix {
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the Markdown, JSON and CSV reports
    Report {
        #[arg(long)]
        scope: Option<PathBuf>,

        #[arg(long)]
        group_by_file: bool,
    },

    /// Look up a key through the translation runtime
    Translate {
        key: String,

        /// Language to translate into (defaults to the primary language)
        #[arg(short, long)]
        lang: Option<String>,

        /// Interpolation parameter, name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Create a default configuration file and empty locale files
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    // `init` must work before any configuration exists.
    let load_config = || Config::load_or_default(cli.config.as_ref());

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Validate {
            scope,
            format,
            output,
            group_by_file,
            fix,
            dry_run,
            no_history,
        } => {
            let args = ValidateArgs {
                scope,
                format,
                output,
                group_by_file,
                fix,
                dry_run,
                no_history,
            };
            if !commands::validate::run(&load_config()?, &args)? {
                std::process::exit(1);
            }
        }
        Commands::Extract { scope, json } => {
            commands::extract::run(&load_config()?, scope.as_deref(), json)?;
        }
        Commands::GenericKeys {
            scope,
            apply,
            dry_run,
        } => {
            commands::generic_keys::run(&load_config()?, scope.as_deref(), apply, dry_run)?;
        }
        Commands::Fix { dry_run } => {
            commands::fix::run(&load_config()?, dry_run)?;
        }
        Commands::Report {
            scope,
            group_by_file,
        } => {
            commands::report::run(&load_config()?, scope.as_deref(), group_by_file)?;
        }
        Commands::Translate { key, lang, params } => {
            commands::translate::run(&load_config()?, &key, lang.as_deref(), &params)?;
        }
    }

    Ok(())
}
