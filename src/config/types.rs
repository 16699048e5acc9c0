// config/types.rs
use serde::{Deserialize, Serialize};
use std::{fs, io, path::{Path, PathBuf}};

use crate::error::HelperError;
use crate::vault::DEFAULT_SERVICE;

pub const CONFIG_FILE_NAME: &str = "kubectl-credentials-helper.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Access marker and service name of every vault record.
    pub service: String,
    pub debug: bool,
    pub log_file: Option<String>,
    pub assume_yes: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            debug: false,
            log_file: None,
            assume_yes: false,
        }
    }
}

impl HelperConfig {
    pub fn load_from_file(path: &str) -> io::Result<Self> {
        let config_str = fs::read_to_string(path)?;
        serde_json::from_str(&config_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.service.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "service must not be empty",
            ));
        }
        if self.log_file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "log_file must not be empty when set",
            ));
        }
        Ok(())
    }

    /// `~/.kube/kubectl-credentials-helper.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kube").join(CONFIG_FILE_NAME))
    }

    /// Loads `explicit` (which must exist), else the default file when it
    /// exists, else the built-in defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self, HelperError> {
        let path = match explicit {
            Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let config = Self::load_from_file(&path.to_string_lossy()).map_err(|e| config_error(&path, e))?;
        config.validate().map_err(|e| config_error(&path, e))?;
        Ok(config)
    }

    pub fn log_file_path(&self) -> Option<String> {
        self.log_file
            .as_deref()
            .map(|f| shellexpand::tilde(f).to_string())
    }
}

fn config_error(path: &Path, error: io::Error) -> HelperError {
    HelperError::Config {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.json");
        fs::write(&path, r#"{"debug": true}"#).unwrap();

        let config = HelperConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert!(config.debug);
        assert_eq!(config.service, DEFAULT_SERVICE);
        assert!(!config.assume_yes);
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.json");
        let config = HelperConfig {
            service: "team-vault".into(),
            log_file: Some("~/helper.log".into()),
            ..Default::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(HelperConfig::load(Some(path.to_str().unwrap())).unwrap(), config);
    }

    #[test]
    fn explicit_file_must_exist_and_be_valid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            HelperConfig::load(Some(missing.to_str().unwrap())),
            Err(HelperError::Config { .. })
        ));

        let invalid = dir.path().join("invalid.json");
        fs::write(&invalid, r#"{"service": " "}"#).unwrap();
        assert!(matches!(
            HelperConfig::load(Some(invalid.to_str().unwrap())),
            Err(HelperError::Config { .. })
        ));
    }

    #[test]
    fn absent_default_file_falls_back_to_defaults() {
        let home = tempfile::tempdir().unwrap();
        temp_env::with_var("HOME", Some(home.path()), || {
            assert_eq!(HelperConfig::load(None).unwrap(), HelperConfig::default());
        });
    }
}
