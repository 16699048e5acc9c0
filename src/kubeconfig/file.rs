// src/kubeconfig/file.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HelperError;
use crate::utils::logging::Logger;

use super::{codec, KubeConfig};

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".back");
    PathBuf::from(name)
}

/// Reads the kubeconfig and writes `<path>.back` before anything is changed.
pub fn load_and_backup(path: &Path, logger: &mut dyn Logger) -> Result<KubeConfig, HelperError> {
    let bytes = fs::read(path).map_err(|source| HelperError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = codec::decode(&bytes).map_err(|source| HelperError::Kubeconfig {
        path: path.to_path_buf(),
        source,
    })?;
    logger.log(&format!("Read: {}", path.display()));

    let back = backup_path(path);
    fs::write(&back, &bytes).map_err(|source| HelperError::Io {
        path: back.clone(),
        source,
    })?;
    logger.log(&format!("Backup: {}", back.display()));

    Ok(config)
}

pub fn write(config: &KubeConfig, path: &Path) -> Result<(), HelperError> {
    let bytes = codec::encode(config).map_err(|source| HelperError::Kubeconfig {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| HelperError::Io {
        path: path.to_path_buf(),
        source,
    })
}
