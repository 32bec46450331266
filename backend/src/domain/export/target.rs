//! Resolving where an exported file lands.
//!
//! Paths typed or pasted by the user are cleaned up before use. A missing
//! directory falls back to the user's Documents folder, then home.

use std::path::{Path, PathBuf};

use shared::ExportTarget;
use tracing::{debug, error};

use crate::error::{StoreError, StoreResult};

/// Basic path sanitization to handle common user input issues
pub fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim();

    // Surrounding quotes, single or double
    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }

    let mut cleaned = cleaned.replace("\\ ", " ");

    while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
        cleaned.pop();
    }

    if cleaned.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if cleaned == "~" {
                cleaned = home.to_string_lossy().to_string();
            } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
            }
        }
    }

    cleaned
}

/// Documents folder, or home when the platform has none
pub fn default_export_dir() -> StoreResult<PathBuf> {
    dirs::document_dir().or_else(dirs::home_dir).ok_or_else(|| {
        error!("Could not determine default export directory");
        StoreError::Export("Failed to determine export directory".to_string())
    })
}

/// Full path of the file to write for `target`, falling back to `default_name`.
///
/// The file name gets `extension` appended when it does not already end in it.
pub fn resolve(target: &ExportTarget, default_name: &str, extension: &str) -> StoreResult<PathBuf> {
    let directory = match target.custom_path.as_deref().map(sanitize_path) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_export_dir()?,
    };

    let name = target
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(default_name);

    let path = directory.join(with_extension(name, extension));
    debug!("Resolved export target {}", path.display());
    Ok(path)
}

fn with_extension(name: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension);
    if name.to_lowercase().ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Create the parent directory of `path` if it is missing
pub fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("\"/tmp/exports\""), "/tmp/exports");
        assert_eq!(sanitize_path("'/tmp/exports'"), "/tmp/exports");
        assert_eq!(sanitize_path("  /path/to/dir  "), "/path/to/dir");
        assert_eq!(sanitize_path("/path\\ to\\ dir"), "/path to dir");
        assert_eq!(sanitize_path("/path/to/dir/"), "/path/to/dir");
        assert_eq!(sanitize_path("/"), "/");

        if let Some(home) = dirs::home_dir() {
            let expected = home.join("Documents").to_string_lossy().to_string();
            assert_eq!(sanitize_path("\"~/Documents\""), expected);
        }
    }

    #[test]
    fn test_resolve_uses_custom_directory_and_extension() {
        let target = ExportTarget {
            custom_path: Some("'/tmp/pv exports/'".to_string()),
            file_name: Some("march".to_string()),
        };

        let path = resolve(&target, "ignored", "pdf").unwrap();

        assert_eq!(path, PathBuf::from("/tmp/pv exports/march.pdf"));
    }

    #[test]
    fn test_resolve_keeps_existing_extension_and_default_name() {
        let target = ExportTarget {
            custom_path: Some("/tmp".to_string()),
            file_name: Some("Report.XLSX".to_string()),
        };
        assert_eq!(resolve(&target, "x", "xlsx").unwrap(), PathBuf::from("/tmp/Report.XLSX"));

        let unnamed = ExportTarget {
            custom_path: Some("/tmp".to_string()),
            file_name: Some("  ".to_string()),
        };
        assert_eq!(
            resolve(&unnamed, "PV_MI-0001", "pdf").unwrap(),
            PathBuf::from("/tmp/PV_MI-0001.pdf")
        );
    }
}
