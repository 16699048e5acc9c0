// src/credentials/mod.rs
pub mod bridge;
pub mod exec;
pub mod prompt;
pub mod report;
pub mod secure;
pub mod undo;

pub use bridge::CredentialBridge;
pub use exec::{ExecCredential, ExecCredentialError, ExecCredentialStatus};
pub use prompt::{AssumeYes, ConsolePrompter, Prompter, ScriptedPrompter};
pub use report::{Outcome, Report, SkipReason};
pub use secure::Securer;
pub use undo::Unsecurer;

use crate::error::HelperError;

/// Absolute path of the running binary, as written into exec descriptors.
pub fn own_executable() -> Result<String, HelperError> {
    let path = std::env::current_exe().map_err(HelperError::Executable)?;
    Ok(path.to_string_lossy().into_owned())
}
