use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "HAMLET_ROOT";
pub const CONTENT_ENV_VAR: &str = "HAMLET_CONTENT_DIR";

const DEFAULT_CONTENT_DIR: [&str; 2] = ["assets", "base"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    /// Directory scanned for `*.xml` town definitions and `tuning.json`.
    pub base_content_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/hamlet\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
    #[error("content directory does not exist: {path}")]
    ContentDirMissing { path: PathBuf },
}

/// Explicit overrides, normally read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverrides {
    pub root: Option<PathBuf>,
    /// Absolute, or relative to the resolved root.
    pub content_dir: Option<PathBuf>,
}

impl PathOverrides {
    pub fn from_env() -> Result<Self, StartupError> {
        Ok(Self {
            root: read_path_var(ROOT_ENV_VAR)?,
            content_dir: read_path_var(CONTENT_ENV_VAR)?,
        })
    }
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let overrides = PathOverrides::from_env()?;
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let exe_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
    resolve_paths_with(&overrides, &exe_dir)
}

/// Resolves the project root (override, else the nearest marked ancestor
/// of `exe_dir`) and the content directory beneath it.
pub fn resolve_paths_with(
    overrides: &PathOverrides,
    exe_dir: &Path,
) -> Result<AppPaths, StartupError> {
    let root = match &overrides.root {
        Some(raw) => {
            let normalized = normalize_path(raw);
            if !is_repo_marker(&normalized) {
                return Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                });
            }
            normalized
        }
        None => exe_dir
            .ancestors()
            .find(|candidate| is_repo_marker(candidate))
            .map(normalize_path)
            .ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(exe_dir),
                env_var: ROOT_ENV_VAR,
            })?,
    };

    let base_content_dir = match &overrides.content_dir {
        Some(dir) if dir.is_absolute() => normalize_path(dir),
        Some(dir) => normalize_path(&root.join(dir)),
        None => DEFAULT_CONTENT_DIR
            .iter()
            .fold(root.clone(), |path, part| path.join(part)),
    };
    if !base_content_dir.is_dir() {
        return Err(StartupError::ContentDirMissing {
            path: base_content_dir,
        });
    }

    Ok(AppPaths {
        root,
        base_content_dir,
    })
}

fn read_path_var(var: &'static str) -> Result<Option<PathBuf>, StartupError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn project() -> TempDir {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        fs::create_dir_all(temp.path().join("assets").join("base")).expect("mkdir");
        fs::create_dir_all(temp.path().join("target").join("debug")).expect("mkdir");
        temp
    }

    #[test]
    fn repo_marker_requires_cargo_toml_and_a_tree() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!is_repo_marker(temp.path()));
        assert!(!is_repo_marker(&temp.path().join("definitely_not_a_marker")));

        fs::create_dir_all(temp.path().join("assets")).expect("mkdir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_by_walking_up_from_the_executable() {
        let temp = project();
        let exe_dir = temp.path().join("target").join("debug");

        let paths = resolve_paths_with(&PathOverrides::default(), &exe_dir).expect("paths");

        assert_eq!(paths.root, normalize_path(temp.path()));
        assert_eq!(
            paths.base_content_dir,
            normalize_path(temp.path()).join("assets").join("base")
        );
    }

    #[test]
    fn root_override_must_be_a_project() {
        let temp = project();
        let elsewhere = TempDir::new().expect("tempdir");
        let overrides = PathOverrides {
            root: Some(elsewhere.path().to_path_buf()),
            content_dir: None,
        };

        let err = resolve_paths_with(&overrides, &temp.path().join("target"))
            .expect_err("invalid root");
        assert!(matches!(err, StartupError::InvalidEnvRoot { .. }));
        assert!(err.to_string().contains(ROOT_ENV_VAR));
    }

    #[test]
    fn relative_content_override_resolves_under_root() {
        let temp = project();
        fs::create_dir_all(temp.path().join("mods").join("winter")).expect("mkdir");
        let overrides = PathOverrides {
            root: Some(temp.path().to_path_buf()),
            content_dir: Some(PathBuf::from("mods/winter")),
        };

        let paths = resolve_paths_with(&overrides, temp.path()).expect("paths");
        assert_eq!(
            paths.base_content_dir,
            normalize_path(temp.path()).join("mods").join("winter")
        );
    }

    #[test]
    fn missing_content_dir_is_reported() {
        let temp = project();
        let overrides = PathOverrides {
            root: None,
            content_dir: Some(PathBuf::from("nope")),
        };

        let err = resolve_paths_with(&overrides, temp.path()).expect_err("missing");
        assert!(matches!(err, StartupError::ContentDirMissing { .. }));
    }

    #[test]
    fn no_marker_anywhere_reports_start_dir() {
        let temp = TempDir::new().expect("tempdir");
        let err = resolve_paths_with(&PathOverrides::default(), temp.path())
            .expect_err("no root");
        match err {
            StartupError::RootNotFound { env_var, .. } => assert_eq!(env_var, ROOT_ENV_VAR),
            other => panic!("unexpected error: {other}"),
        }
    }
}
