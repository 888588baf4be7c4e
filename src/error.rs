use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a locale dictionary. Any of these halts a validation run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No locale file exists for the language
    #[error("Locale file for '{language}' not found: {}\n\nTip: run `i18n-guard init` or check `localesDir` in i18n-guard.json", path.display())]
    Missing { language: String, path: PathBuf },

    /// The file exists but could not be read
    #[error("Failed to read locale file {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// The file is not valid JSON / JSON5
    #[error("Failed to parse locale file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The document parsed, but its root is not an object
    #[error("Locale file {} must contain an object at its root", path.display())]
    NotAnObject { path: PathBuf },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Missing { path, .. }
            | Self::Unreadable { path, .. }
            | Self::Parse { path, .. }
            | Self::NotAnObject { path } => path,
        }
    }
}

/// Result type alias for dictionary loading
pub type LoadResult<T> = std::result::Result<T, LoadError>;
