//! Home directory resolution.

use std::io;
use std::path::{Path, PathBuf};

/// Platform base for the default home directory: the roaming data dir
/// (`%APPDATA%`) on Windows, the user's home elsewhere.
fn platform_base() -> io::Result<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        dirs::data_dir()
    } else {
        dirs::home_dir()
    };
    base.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory for the current user"))
}

/// Expand a leading `~` against `base`.
pub fn expand_tilde(raw: &str, base: &Path) -> PathBuf {
    match raw.strip_prefix('~') {
        Some("") => base.to_path_buf(),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => base.join(&rest[1..]),
        _ => PathBuf::from(raw),
    }
}

/// Resolve the application home directory.
///
/// - `None` (or blank) => `<platform base>/<default_subdir>`
/// - `~/x` => expanded against the platform base
/// - relative paths => made absolute against the current directory
///
/// With `create`, the directory is created if missing.
pub fn resolve_home_dir(raw: Option<String>, default_subdir: &str, create: bool) -> io::Result<PathBuf> {
    let raw = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let path = match raw {
        None => platform_base()?.join(default_subdir),
        Some(s) if s.starts_with('~') => expand_tilde(&s, &platform_base()?),
        Some(s) => PathBuf::from(s),
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    if create {
        std::fs::create_dir_all(&path)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tilde_expansion() {
        let base = Path::new("/home/ann");
        assert_eq!(expand_tilde("~", base), PathBuf::from("/home/ann"));
        assert_eq!(expand_tilde("~/.dashkit", base), PathBuf::from("/home/ann/.dashkit"));
        assert_eq!(expand_tilde("/srv/dashkit", base), PathBuf::from("/srv/dashkit"));
        assert_eq!(expand_tilde("~bob/x", base), PathBuf::from("~bob/x"));
    }

    #[test]
    fn absolute_dir_is_created() {
        let tmp = tempdir().unwrap();
        let want = tmp.path().join("a").join("b");
        let got = resolve_home_dir(Some(want.to_string_lossy().into_owned()), ".dashkit", true).unwrap();
        assert_eq!(got, want);
        assert!(want.is_dir());
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn default_and_tilde_resolve_under_user_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let got = resolve_home_dir(None, ".dashkit", false).unwrap();
        assert_eq!(got, home.join(".dashkit"));
        let got = resolve_home_dir(Some("~/.dashkit-alt".into()), ".dashkit", false).unwrap();
        assert_eq!(got, home.join(".dashkit-alt"));
    }

    #[test]
    fn relative_dir_becomes_absolute() {
        let got = resolve_home_dir(Some("some/rel".into()), ".dashkit", false).unwrap();
        assert!(got.is_absolute());
        assert!(got.ends_with("some/rel"));
    }
}
