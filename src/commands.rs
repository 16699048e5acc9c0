// src/commands.rs
//! One function per subcommand, with every collaborator passed in.

use std::io::Write;
use std::path::Path;

use crate::credentials::{CredentialBridge, Prompter, Report, Securer, Unsecurer};
use crate::error::HelperError;
use crate::kubeconfig::file;
use crate::utils::logging::Logger;
use crate::vault::SecretVault;

pub fn secure_file(
    path: &Path,
    only_user: Option<&str>,
    vault: &dyn SecretVault,
    prompter: &mut dyn Prompter,
    logger: &mut dyn Logger,
    executable: &str,
) -> Result<Report, HelperError> {
    let mut config = file::load_and_backup(path, logger)?;
    let report = Securer::new(vault, prompter, logger, executable).secure(&mut config, only_user)?;
    file::write(&config, path)?;
    logger.log(&report.summary("Secured"));
    logger.log(&format!("Wrote: {}", path.display()));
    Ok(report)
}

pub fn undo_file(
    path: &Path,
    vault: &dyn SecretVault,
    logger: &mut dyn Logger,
    executable: &str,
) -> Result<Report, HelperError> {
    let mut config = file::load_and_backup(path, logger)?;
    let report = Unsecurer::new(vault, logger, executable).undo(&mut config)?;
    file::write(&config, path)?;
    logger.log(&report.summary("Restored"));
    logger.log(&format!("Wrote: {}", path.display()));
    Ok(report)
}

pub fn answer_request<W: Write>(
    raw: &str,
    vault: &dyn SecretVault,
    logger: &mut dyn Logger,
    out: &mut W,
) -> Result<(), HelperError> {
    logger.debug_log(&format!("{}: {:?}", crate::credentials::exec::EXEC_INFO_ENV, raw));
    CredentialBridge::new(vault, logger).run(raw, out)
}
