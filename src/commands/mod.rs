pub mod extract;
pub mod fix;
pub mod generic_keys;
pub mod init;
pub mod report;
pub mod translate;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::fs::{FileSystem, RealFileSystem};
use crate::logging;

/// Write a generated file, creating its directory first.
pub(crate) fn write_output_file(path: &Path, content: &str) -> Result<()> {
    write_output_file_with(&RealFileSystem, path, content)
}

fn write_output_file_with<F: FileSystem>(fs: &F, path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs.atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Whether a source scan is possible: an explicit scope, or an existing source root.
pub(crate) fn should_scan_source(config: &Config, scope: Option<&Path>) -> bool {
    if scope.is_some() {
        return true;
    }
    let root = config.source_root();
    if root.exists() {
        true
    } else {
        logging::debug(&format!(
            "Source directory {} not found; checking dictionaries only",
            root.display()
        ));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::InMemoryFileSystem;

    #[test]
    fn output_file_goes_through_the_file_system() {
        let fs = InMemoryFileSystem::new();
        write_output_file_with(&fs, Path::new("reports/nested/i18n.md"), "# Report\n").unwrap();
        assert_eq!(fs.contents("reports/nested/i18n.md").as_deref(), Some("# Report\n"));
        assert!(fs.exists(Path::new("reports/nested")));
    }
}
