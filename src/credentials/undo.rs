// src/credentials/undo.rs
use crate::error::HelperError;
use crate::kubeconfig::{codec, KubeConfig, LinkedCluster, SensitiveFields};
use crate::utils::logging::Logger;
use crate::vault::{SecretVault, VaultError};

use super::report::{Outcome, Report, SkipReason};

/// Puts sensitive fields back into users that were delegated to this
/// helper. Vault records stay where they are.
pub struct Unsecurer<'a> {
    vault: &'a dyn SecretVault,
    logger: &'a mut dyn Logger,
    executable: String,
}

impl<'a> Unsecurer<'a> {
    pub fn new(vault: &'a dyn SecretVault, logger: &'a mut dyn Logger, executable: &str) -> Self {
        Self {
            vault,
            logger,
            executable: executable.to_string(),
        }
    }

    pub fn undo(&mut self, config: &mut KubeConfig) -> Result<Report, HelperError> {
        let mut report = Report::default();

        for name in config.user_names() {
            self.logger.log(&format!("Found user: {}", name));
            let outcome = self.undo_user(config, &name)?;
            match &outcome {
                Outcome::Skipped { reason, .. } => {
                    self.logger.log(&format!("Skip user {}: {}", name, reason));
                }
                _ => self.logger.log(&format!("Unsecured user: {}", name)),
            }
            report.push(outcome);
        }

        Ok(report)
    }

    fn undo_user(&mut self, config: &mut KubeConfig, name: &str) -> Result<Outcome, HelperError> {
        let skipped = |reason| Outcome::Skipped {
            user: name.to_string(),
            reason,
        };

        let delegated = config
            .auth_info(name)
            .is_some_and(|auth| auth.is_delegated_to(&self.executable));
        if !delegated {
            return Ok(skipped(SkipReason::NotDelegated));
        }

        let linked = config.clusters_for_user(name);
        if linked.is_empty() {
            return Ok(skipped(SkipReason::NoContexts));
        }

        // The first cluster with a readable record wins.
        for link in &linked {
            self.logger.log(&format!(
                "Found cluster {} ({}) via context {}",
                link.cluster, link.server, link.context
            ));
            let Some(fields) = self.fetch(name, link)? else {
                continue;
            };
            if let Some(auth) = config.auth_info_mut(name) {
                auth.restore_sensitive_data(fields);
                auth.exec = None;
            }
            self.logger.log(&format!(
                "Restored from secret: {} ({})",
                link.cluster, link.server
            ));
            return Ok(Outcome::Restored {
                user: name.to_string(),
                server: link.server.clone(),
            });
        }

        Ok(skipped(SkipReason::NoStoredSecret))
    }

    /// `Ok(None)` when this cluster has nothing usable for `name`; the next
    /// one is tried.
    fn fetch(&mut self, name: &str, link: &LinkedCluster) -> Result<Option<SensitiveFields>, HelperError> {
        let record = match self.vault.get(&link.server) {
            Ok(record) => record,
            Err(VaultError::NotFound(_)) => {
                self.logger.log(&format!(
                    "Skip cluster {}: no secret stored for {}",
                    link.cluster, link.server
                ));
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if record.label != name {
            self.logger.log(&format!(
                "Skip cluster {}: the secret for {} belongs to user {}",
                link.cluster, link.server, record.label
            ));
            return Ok(None);
        }

        let fragment = match codec::decode_base64(&record.payload) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.logger.log(&format!(
                    "Skip cluster {}: stored secret is unreadable: {}",
                    link.cluster, e
                ));
                return Ok(None);
            }
        };

        match fragment.auth_info(name) {
            Some(auth) => Ok(Some(auth.sensitive_fields())),
            None => {
                self.logger.log(&format!(
                    "Skip cluster {}: stored secret holds no user {}",
                    link.cluster, name
                ));
                Ok(None)
            }
        }
    }
}
