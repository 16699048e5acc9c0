// config/discovery.rs
use std::env;
use std::path::{Path, PathBuf};

use crate::error::HelperError;
use crate::utils::logging::Logger;

pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// `--kubeconfig`, else the first entry of `KUBECONFIG`, else
/// `~/.kube/config`. The result is absolute and points at a file.
pub fn find_kubeconfig(flag: Option<&str>, logger: &mut dyn Logger) -> Result<PathBuf, HelperError> {
    let candidate = match flag.filter(|f| !f.is_empty()) {
        Some(path) => expand(path),
        None => {
            logger.log("--kubeconfig was not set, trying KUBECONFIG");
            match from_env() {
                Some(path) => path,
                None => {
                    logger.log("KUBECONFIG was not set, trying user home default");
                    dirs::home_dir()
                        .map(|home| home.join(".kube").join("config"))
                        .ok_or_else(|| {
                            HelperError::KubeconfigNotFound(
                                "set --kubeconfig or KUBECONFIG, no home directory found".to_string(),
                            )
                        })?
                }
            }
        }
    };

    let absolute = absolutize(&candidate)?;
    if !absolute.is_file() {
        return Err(HelperError::KubeconfigNotFound(format!(
            "{} does not exist",
            absolute.display()
        )));
    }
    logger.log(&format!("Found: {}", absolute.display()));
    Ok(absolute)
}

fn from_env() -> Option<PathBuf> {
    let value = env::var_os(KUBECONFIG_ENV)?;
    env::split_paths(&value)
        .find(|p| !p.as_os_str().is_empty())
        .map(|p| expand(&p.to_string_lossy()))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn absolutize(path: &Path) -> Result<PathBuf, HelperError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| HelperError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::MemoryLogger;
    use std::fs;

    #[test]
    fn flag_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let flagged = dir.path().join("flagged");
        let from_env = dir.path().join("from-env");
        fs::write(&flagged, "").unwrap();
        fs::write(&from_env, "").unwrap();

        temp_env::with_var(KUBECONFIG_ENV, Some(&from_env), || {
            let mut logger = MemoryLogger::default();
            let found = find_kubeconfig(flagged.to_str(), &mut logger).unwrap();
            assert_eq!(found, flagged);
        });
    }

    #[test]
    fn first_kubeconfig_entry_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::write(&first, "").unwrap();
        fs::write(&second, "").unwrap();
        let joined = env::join_paths([&first, &second]).unwrap();

        temp_env::with_var(KUBECONFIG_ENV, Some(joined), || {
            let mut logger = MemoryLogger::default();
            assert_eq!(find_kubeconfig(None, &mut logger).unwrap(), first);
        });
    }

    #[test]
    fn falls_back_to_home_and_requires_file() {
        let home = tempfile::tempdir().unwrap();
        temp_env::with_vars(
            [
                (KUBECONFIG_ENV, None::<&Path>),
                ("HOME", Some(home.path())),
            ],
            || {
                let mut logger = MemoryLogger::default();
                assert!(matches!(
                    find_kubeconfig(None, &mut logger),
                    Err(HelperError::KubeconfigNotFound(_))
                ));

                fs::create_dir_all(home.path().join(".kube")).unwrap();
                fs::write(home.path().join(".kube").join("config"), "").unwrap();
                let found = find_kubeconfig(None, &mut logger).unwrap();
                assert_eq!(found, home.path().join(".kube").join("config"));
            },
        );
    }
}
