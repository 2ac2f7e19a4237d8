use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user's home directory ({0} is not set)")]
    NoHome(&'static str),
    #[error("failed to create directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(target_os = "windows")]
const HOME_VAR: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const HOME_VAR: &str = "HOME";

fn platform_home() -> Result<PathBuf, HomeDirError> {
    std::env::var_os(HOME_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::NoHome(HOME_VAR))
}

/// Expand a leading `~` and make the path absolute against the current dir.
fn expand(raw: &str) -> Result<PathBuf, HomeDirError> {
    let path = if raw == "~" {
        platform_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        platform_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = std::env::current_dir().map_err(|source| HomeDirError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(cwd.join(path))
    }
}

/// Resolve the application home directory.
///
/// `None` (or an empty string) means `<platform home>/<default_subdir>`.
/// With `create`, the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand(raw)?,
        _ => platform_home()?.join(default_subdir),
    };

    if create {
        ensure_dir(&resolved)?;
    }
    Ok(resolved)
}

fn ensure_dir(path: &Path) -> Result<(), HomeDirError> {
    std::fs::create_dir_all(path).map_err(|source| HomeDirError::Create {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        let got = resolve_home_dir(Some(target.to_string_lossy().into_owned()), ".x", true).unwrap();
        assert_eq!(got, target);
        assert!(target.is_dir());
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let got = resolve_home_dir(Some("some/relative".into()), ".x", false).unwrap();
        assert!(got.is_absolute());
        assert!(got.ends_with("some/relative"));
    }

    #[test]
    fn tilde_is_expanded() {
        let got = resolve_home_dir(Some("~/.tilde_test".into()), ".x", false).unwrap();
        assert!(got.is_absolute());
        assert!(!got.to_string_lossy().starts_with('~'));
        assert!(got.ends_with(".tilde_test"));
    }
}
