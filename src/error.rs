// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::exec::ExecCredentialError;
use crate::kubeconfig::CodecError;
use crate::vault::VaultError;

/// Errors that abort a whole invocation. Per-user and per-cluster problems
/// never surface here; they end up as skip entries in a run report.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("kubeconfig not found: {0}")]
    KubeconfigNotFound(String),
    #[error("config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    ExecCredential(#[from] ExecCredentialError),
    #[error("cannot encode credentials of user {user}: {source}")]
    Fragment {
        user: String,
        #[source]
        source: CodecError,
    },
    #[error("stored credentials for {key} are unreadable: {source}")]
    Payload {
        key: String,
        #[source]
        source: CodecError,
    },
    #[error("stored credentials for {key} hold no user named {label}")]
    MissingUser { key: String, label: String },
    #[error("stored credentials for {key} have no client certificate or key")]
    NoClientCertificate { key: String },
    #[error("cannot determine own executable path: {0}")]
    Executable(#[source] io::Error),
    #[error("cannot write credential response: {0}")]
    Output(#[source] io::Error),
    #[error("cannot encode credential response: {0}")]
    Response(#[source] serde_json::Error),
}
