//! `.env` bootstrap.
//!
//! Variables already present in the process environment always win over the
//! file. A missing file is not an error.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

static DOTENV: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Load `.env` from the current directory (or its parents) once per process.
///
/// Returns the path of the loaded file, or `None` when no file was found or it
/// failed to parse. Subsequent calls return the first call's result without
/// touching the filesystem again.
pub fn load_dotenv() -> Option<PathBuf> {
    DOTENV
        .get_or_init(|| match dotenvy::dotenv() {
            Ok(path) => {
                debug!(path = %path.display(), "Loaded environment file");
                Some(path)
            }
            Err(e) if e.not_found() => None,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable environment file");
                None
            }
        })
        .clone()
}

/// Load a specific environment file. Missing files are a no-op.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_dotenv_from_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_dotenv_from(dir.path().join("absent.env")).unwrap();
        assert!(!loaded);
    }

    #[test]
    fn test_load_dotenv_from_sets_unset_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "CATALOG_DOTENV_SAMPLE=from-file").unwrap();

        temp_env::with_var_unset("CATALOG_DOTENV_SAMPLE", || {
            assert!(load_dotenv_from(&path).unwrap());
            assert_eq!(
                std::env::var("CATALOG_DOTENV_SAMPLE").unwrap(),
                "from-file"
            );
        });
    }

    #[test]
    fn test_load_dotenv_from_keeps_existing_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "CATALOG_DOTENV_KEEP=from-file\n").unwrap();

        temp_env::with_var("CATALOG_DOTENV_KEEP", Some("from-process"), || {
            load_dotenv_from(&path).unwrap();
            load_dotenv_from(&path).unwrap();
            assert_eq!(
                std::env::var("CATALOG_DOTENV_KEEP").unwrap(),
                "from-process"
            );
        });
    }

    #[test]
    fn test_load_dotenv_is_memoized() {
        let first = load_dotenv();
        let second = load_dotenv();
        assert_eq!(first, second);
    }
}
