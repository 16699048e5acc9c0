//! Uniform create/get/delete over a secret store, keyed by cluster endpoint.
//!
//! Every record carries an access marker naming this application. Records
//! with a different marker are invisible to `get` and `delete`, so a shared
//! store never leaks unrelated entries into a kubeconfig.

mod memory;
mod native;

pub use memory::MemoryVault;
pub use native::KeyringVault;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SERVICE: &str = "kubectl-credentials-helper";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("no secret stored for {0}")]
    NotFound(String),
    #[error("a secret for {0} already exists")]
    DuplicateKey(String),
    #[error("{count} secrets match {key}, the secret store is inconsistent")]
    AmbiguousMatch { key: String, count: usize },
    #[error("secret store failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Name of the user whose credentials the payload holds.
    pub label: String,
    /// Cluster endpoint URL.
    pub key: String,
    /// Base64 single-user kubeconfig fragment.
    pub payload: String,
}

pub trait SecretVault {
    /// Fails with [`VaultError::DuplicateKey`] instead of overwriting.
    fn create(&self, label: &str, key: &str, payload: &str) -> Result<(), VaultError>;
    fn get(&self, key: &str) -> Result<SecretRecord, VaultError>;
    fn delete(&self, key: &str) -> Result<(), VaultError>;
}

/// What a backend actually stores as the secret value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RecordEnvelope {
    pub marker: String,
    pub label: String,
    pub payload: String,
}

impl RecordEnvelope {
    pub fn new(marker: &str, label: &str, payload: &str) -> Self {
        Self {
            marker: marker.to_string(),
            label: label.to_string(),
            payload: payload.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, VaultError> {
        serde_json::to_string(self).map_err(|e| VaultError::Backend(format!("encode record: {}", e)))
    }

    /// `None` when the stored value was not written by an application using
    /// `marker`.
    pub fn parse_owned(raw: &str, marker: &str) -> Option<Self> {
        serde_json::from_str::<RecordEnvelope>(raw)
            .ok()
            .filter(|envelope| envelope.marker == marker)
    }

    pub fn into_record(self, key: &str) -> SecretRecord {
        SecretRecord {
            label: self.label,
            key: key.to_string(),
            payload: self.payload,
        }
    }
}
