//! # chrome-locate
//!
//! Find a Chrome or Chromium executable on the current machine so a
//! headless-rendering caller does not have to ask users for a path.
//!
//! ## How it works
//!
//! On first call to [`locate_chrome`]:
//!
//! 1. If `CHROME_PATH` is set, that path is used (and must exist).
//! 2. Otherwise the platform's well-known install locations are checked.
//! 3. Otherwise every directory on `PATH` is searched for the usual binary
//!    names (`chromium`, `google-chrome`, `chrome`, …).
//!
//! The result is cached for the rest of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! let chrome = chrome_locate::locate_chrome().expect("no Chrome installed");
//! println!("using {}", chrome.display());
//! ```
//!
//! ## Platform support
//!
//! | OS      | Well-known locations                                            |
//! |---------|-----------------------------------------------------------------|
//! | macOS   | `/Applications/*.app/Contents/MacOS/*`, same under `~/Applications` |
//! | Linux   | `/usr/bin`, `/usr/local/bin`, `/snap/bin`, `/opt/google/chrome` |
//! | Windows | `%ProgramFiles%`, `%ProgramFiles(x86)%`, `%LOCALAPPDATA%`       |

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides every other lookup.
pub const ENV_OVERRIDE: &str = "CHROME_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// `CHROME_PATH` is set but does not point at an existing file.
    #[error("CHROME_PATH is set to '{path}' but no file exists there")]
    OverrideMissing { path: PathBuf },

    /// Nothing usable was found anywhere.
    #[error(
        "No Chrome/Chromium executable found ({} locations checked).\n\
Install Chromium or set CHROME_PATH=/path/to/chrome",
        .searched.len()
    )]
    NotFound { searched: Vec<PathBuf> },
}

// ── Platform candidates ──────────────────────────────────────────────────────

/// Executable names searched for on `PATH`, most specific first.
pub fn binary_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["chrome.exe", "msedge.exe"]
    } else {
        &[
            "chromium",
            "chromium-browser",
            "google-chrome",
            "google-chrome-stable",
            "chrome",
            "headless_shell",
        ]
    }
}

/// Well-known absolute install locations for the current OS.
pub fn well_known_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    match std::env::consts::OS {
        "macos" => {
            let apps = [
                "Google Chrome.app/Contents/MacOS/Google Chrome",
                "Chromium.app/Contents/MacOS/Chromium",
                "Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
            ];
            for app in apps {
                paths.push(Path::new("/Applications").join(app));
                if let Some(home) = dirs::home_dir() {
                    paths.push(home.join("Applications").join(app));
                }
            }
        }
        "linux" => {
            for dir in ["/usr/bin", "/usr/local/bin", "/snap/bin"] {
                for name in binary_names() {
                    paths.push(Path::new(dir).join(name));
                }
            }
            paths.push(PathBuf::from("/opt/google/chrome/chrome"));
        }
        "windows" => {
            let suffix = Path::new("Google")
                .join("Chrome")
                .join("Application")
                .join("chrome.exe");
            for var in ["ProgramFiles", "ProgramFiles(x86)"] {
                if let Some(base) = std::env::var_os(var) {
                    paths.push(PathBuf::from(base).join(&suffix));
                }
            }
            if let Some(local) = dirs::data_local_dir() {
                paths.push(local.join(&suffix));
            }
        }
        _ => {}
    }

    paths
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Locate a Chrome/Chromium executable, caching the answer process-wide.
///
/// Safe to call from multiple threads; the filesystem is only searched
/// until one call succeeds.
pub fn locate_chrome() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = locate_with(
        std::env::var_os(ENV_OVERRIDE),
        std::env::var_os("PATH"),
        &well_known_paths(),
    )?;

    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Returns `true` if [`locate_chrome`] would succeed.
pub fn is_chrome_available() -> bool {
    locate_chrome().is_ok()
}

/// Search each directory of a `PATH`-style list for the first of `names`.
pub fn find_in_path(names: &[&str], path_var: &OsString) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Lookup with every input injected, so tests never touch the real env.
fn locate_with(
    env_override: Option<OsString>,
    path_var: Option<OsString>,
    well_known: &[PathBuf],
) -> Result<PathBuf, LocateError> {
    // 1. Environment variable override.
    if let Some(raw) = env_override.filter(|v| !v.is_empty()) {
        let path = PathBuf::from(raw);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(LocateError::OverrideMissing { path })
        };
    }

    // 2. Well-known install locations.
    if let Some(found) = well_known.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    // 3. PATH search.
    if let Some(found) = path_var
        .as_ref()
        .and_then(|p| find_in_path(binary_names(), p))
    {
        return Ok(found);
    }

    let mut searched = well_known.to_vec();
    if let Some(p) = path_var.as_ref() {
        for dir in std::env::split_paths(p) {
            searched.extend(binary_names().iter().map(|n| dir.join(n)));
        }
    }
    Err(LocateError::NotFound { searched })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"#!/bin/sh\n").unwrap();
        p
    }

    #[test]
    fn override_wins_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let chrome = touch(dir.path(), "my-chrome");
        let other = touch(dir.path(), binary_names()[0]);

        let found = locate_with(Some(chrome.clone().into_os_string()), None, &[other]).unwrap();
        assert_eq!(found, chrome);
    }

    #[test]
    fn override_pointing_nowhere_is_an_error() {
        let err = locate_with(Some("/definitely/not/here/chrome".into()), None, &[]).unwrap_err();
        assert!(matches!(err, LocateError::OverrideMissing { .. }));
        assert!(err.to_string().contains(ENV_OVERRIDE));
    }

    #[test]
    fn empty_override_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let known = touch(dir.path(), "known-chrome");
        let found = locate_with(Some(OsString::new()), None, &[known.clone()]).unwrap();
        assert_eq!(found, known);
    }

    #[test]
    fn well_known_checked_before_path() {
        let known_dir = tempfile::tempdir().unwrap();
        let path_dir = tempfile::tempdir().unwrap();
        let known = touch(known_dir.path(), "chrome-known");
        touch(path_dir.path(), binary_names()[0]);

        let found = locate_with(
            None,
            Some(path_dir.path().as_os_str().to_owned()),
            &[known.clone()],
        )
        .unwrap();
        assert_eq!(found, known);
    }

    #[test]
    fn path_search_finds_binary() {
        let dir = tempfile::tempdir().unwrap();
        let expected = touch(dir.path(), binary_names()[0]);
        let path_var = std::env::join_paths([dir.path()]).unwrap();

        let found = locate_with(None, Some(path_var), &[]).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn not_found_reports_searched_locations() {
        let dir = tempfile::tempdir().unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();
        let missing = dir.path().join("nope");

        let err = locate_with(None, Some(path_var), &[missing.clone()]).unwrap_err();
        match err {
            LocateError::NotFound { searched } => {
                assert!(searched.contains(&missing));
                assert!(searched.len() > 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn find_in_path_skips_directories_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(binary_names()[0])).unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();
        assert!(find_in_path(&[binary_names()[0]], &path_var).is_none());
    }
}
