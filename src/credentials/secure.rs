// src/credentials/secure.rs
use std::collections::HashMap;

use crate::error::HelperError;
use crate::kubeconfig::{codec, ExecConfig, KubeConfig, LinkedCluster};
use crate::utils::logging::Logger;
use crate::vault::{SecretVault, VaultError};

use super::prompt::Prompter;
use super::report::{Outcome, Report, SkipReason};

/// Moves client certificates, keys and basic-auth credentials out of a
/// kubeconfig into the vault, and points each user at this helper instead.
pub struct Securer<'a> {
    vault: &'a dyn SecretVault,
    prompter: &'a mut dyn Prompter,
    logger: &'a mut dyn Logger,
    executable: String,
    /// Endpoint -> user, for records written during the current run.
    written: HashMap<String, String>,
}

impl<'a> Securer<'a> {
    pub fn new(
        vault: &'a dyn SecretVault,
        prompter: &'a mut dyn Prompter,
        logger: &'a mut dyn Logger,
        executable: &str,
    ) -> Self {
        Self {
            vault,
            prompter,
            logger,
            executable: executable.to_string(),
            written: HashMap::new(),
        }
    }

    /// Secures every user, or only `only_user` when given. The config is
    /// modified in place; writing it back is up to the caller.
    pub fn secure(
        &mut self,
        config: &mut KubeConfig,
        only_user: Option<&str>,
    ) -> Result<Report, HelperError> {
        let mut report = Report::default();
        self.written.clear();

        if let Some(user) = only_user {
            self.logger.log(&format!("Looking up for a specific user {}", user));
            if config.auth_info(user).is_none() {
                self.logger.log(&format!("User {} not found in the kubeconfig", user));
            }
        }

        for name in config.user_names() {
            let outcome = match only_user {
                Some(selected) if selected != name => Outcome::Skipped {
                    user: name.clone(),
                    reason: SkipReason::NotSelected,
                },
                _ => self.secure_user(config, &name)?,
            };
            if let Outcome::Skipped { reason, .. } = &outcome {
                self.logger.log(&format!("Skip user {}: {}", name, reason));
            }
            report.push(outcome);
        }

        Ok(report)
    }

    fn secure_user(&mut self, config: &mut KubeConfig, name: &str) -> Result<Outcome, HelperError> {
        let skipped = |reason| Outcome::Skipped {
            user: name.to_string(),
            reason,
        };

        let fields = match config.auth_info(name) {
            Some(auth) if auth.has_sensitive_data() => auth.sensitive_fields(),
            _ => return Ok(skipped(SkipReason::NothingToSecure)),
        };
        self.logger.log(&format!("Found user: {}", name));

        let fragment = config.fragment(name, fields);
        let payload = codec::encode_base64(&fragment).map_err(|source| HelperError::Fragment {
            user: name.to_string(),
            source,
        })?;

        let linked = config.clusters_for_user(name);
        if linked.is_empty() {
            return Ok(skipped(SkipReason::NoContexts));
        }

        let mut servers: Vec<String> = Vec::new();
        for link in &linked {
            if servers.contains(&link.server) {
                continue;
            }
            self.logger.log(&format!(
                "Found cluster {} ({}) via context {}",
                link.cluster, link.server, link.context
            ));
            if self.store(name, link, &payload)? {
                servers.push(link.server.clone());
            }
        }

        if servers.is_empty() {
            return Ok(skipped(SkipReason::NothingStored));
        }

        if !self
            .prompter
            .confirm(&format!("Remove sensitive parts from the user {}?", name))
        {
            return Ok(skipped(SkipReason::Declined));
        }

        if let Some(auth) = config.auth_info_mut(name) {
            auth.clear_sensitive_data();
            auth.exec = Some(ExecConfig::delegate_to(&self.executable));
        }
        self.logger.log(&format!("Secured user: {}", name));

        Ok(Outcome::Secured {
            user: name.to_string(),
            servers,
        })
    }

    /// `Ok(false)` means this cluster was skipped; the user may still be
    /// secured through another one.
    fn store(&mut self, name: &str, link: &LinkedCluster, payload: &str) -> Result<bool, HelperError> {
        if link.server.is_empty() {
            self.logger
                .log(&format!("Skip cluster {}: no server endpoint", link.cluster));
            return Ok(false);
        }

        if !self.prompter.confirm(&format!(
            "Create secret for {} ({})?",
            link.cluster, link.server
        )) {
            self.logger.log(&format!("Ok, skip {}", link.cluster));
            return Ok(false);
        }

        match self.vault.create(name, &link.server, payload) {
            Ok(()) => {
                self.logger.log(&format!(
                    "Created secret: {} ({})",
                    link.cluster, link.server
                ));
                self.written.insert(link.server.clone(), name.to_string());
                Ok(true)
            }
            Err(VaultError::DuplicateKey(_)) => match self.written.get(&link.server).cloned() {
                Some(owner) if owner != name => {
                    self.logger.log(&format!(
                        "Skip cluster {}: the secret for {} was just stored for user {}",
                        link.cluster, link.server, owner
                    ));
                    Ok(false)
                }
                _ => self.replace(name, link, payload),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&mut self, name: &str, link: &LinkedCluster, payload: &str) -> Result<bool, HelperError> {
        if !self.prompter.confirm(&format!(
            "Secret for {} ({}) already found in your vault, replace?",
            link.cluster, link.server
        )) {
            self.logger.log(&format!("Ok, skip {}", link.cluster));
            return Ok(false);
        }

        match self.vault.delete(&link.server) {
            Ok(()) => {}
            Err(VaultError::NotFound(_)) => {
                self.logger.log(&format!(
                    "Skip cluster {}: the existing secret for {} was not created by this helper",
                    link.cluster, link.server
                ));
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        self.vault.create(name, &link.server, payload)?;
        self.written.insert(link.server.clone(), name.to_string());
        self.logger
            .log(&format!("Secret {} ({}) replaced", link.cluster, link.server));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::prompt::{AssumeYes, ScriptedPrompter};
    use crate::kubeconfig::{AuthInfo, Cluster, Context, NamedAuthInfo, NamedCluster, NamedContext};
    use crate::utils::logging::MemoryLogger;
    use crate::vault::{MemoryVault, DEFAULT_SERVICE};

    const HELPER: &str = "/usr/local/bin/kubectl-credentials-helper";

    fn config() -> KubeConfig {
        KubeConfig {
            api_version: Some("v1".into()),
            kind: Some("Config".into()),
            clusters: vec![
                NamedCluster {
                    name: "c1".into(),
                    cluster: Cluster { server: "https://a.example".into(), ..Default::default() },
                },
                NamedCluster {
                    name: "c2".into(),
                    cluster: Cluster { server: "https://b.example".into(), ..Default::default() },
                },
            ],
            contexts: vec![
                NamedContext {
                    name: "ctx1".into(),
                    context: Context { cluster: "c1".into(), user: "alice".into(), ..Default::default() },
                },
                NamedContext {
                    name: "ctx2".into(),
                    context: Context { cluster: "c2".into(), user: "alice".into(), ..Default::default() },
                },
                NamedContext {
                    name: "ctx3".into(),
                    context: Context { cluster: "c2".into(), user: "bob".into(), ..Default::default() },
                },
            ],
            users: vec![
                NamedAuthInfo {
                    name: "alice".into(),
                    user: AuthInfo {
                        client_certificate_data: Some("Y2VydA==".into()),
                        client_key_data: Some("a2V5".into()),
                        ..Default::default()
                    },
                },
                NamedAuthInfo {
                    name: "bob".into(),
                    user: AuthInfo {
                        username: Some("bob".into()),
                        password: Some("hunter2".into()),
                        ..Default::default()
                    },
                },
                NamedAuthInfo {
                    name: "orphan".into(),
                    user: AuthInfo {
                        password: Some("x".into()),
                        ..Default::default()
                    },
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn secures_users_with_contexts() {
        let vault = MemoryVault::new(DEFAULT_SERVICE);
        let mut prompter = AssumeYes;
        let mut logger = MemoryLogger::default();
        let mut cfg = config();

        let report = Securer::new(&vault, &mut prompter, &mut logger, HELPER)
            .secure(&mut cfg, None)
            .unwrap();

        assert_eq!(
            report.outcome_for("alice"),
            Some(&Outcome::Secured {
                user: "alice".into(),
                servers: vec!["https://a.example".into(), "https://b.example".into()],
            })
        );
        // bob shares c2 with alice, whose record was written earlier in
        // this run; it is kept even though the prompter says yes.
        assert_eq!(
            report.outcome_for("bob"),
            Some(&Outcome::Skipped { user: "bob".into(), reason: SkipReason::NothingStored })
        );
        assert_eq!(
            report.outcome_for("orphan"),
            Some(&Outcome::Skipped { user: "orphan".into(), reason: SkipReason::NoContexts })
        );

        let alice = cfg.auth_info("alice").unwrap();
        assert!(!alice.has_sensitive_data());
        assert!(alice.is_delegated_to(HELPER));
        assert_eq!(vault.get("https://a.example").unwrap().label, "alice");
        assert_eq!(vault.get("https://b.example").unwrap().label, "alice");
        assert!(cfg.auth_info("bob").unwrap().has_sensitive_data());
        assert!(logger.lines.iter().any(|l| l.contains("just stored for user alice")));
        assert!(cfg.auth_info("orphan").unwrap().has_sensitive_data());
    }

    #[test]
    fn declined_duplicate_keeps_existing_record() {
        let vault = MemoryVault::new(DEFAULT_SERVICE);
        vault.create("someone", "https://a.example", "old").unwrap();
        // create c1? yes, replace? no, create c2? yes, strip alice? yes
        let mut prompter = ScriptedPrompter::new([true, false, true, true]);
        let mut logger = MemoryLogger::default();
        let mut cfg = config();

        let report = Securer::new(&vault, &mut prompter, &mut logger, HELPER)
            .secure(&mut cfg, Some("alice"))
            .unwrap();

        assert_eq!(vault.get("https://a.example").unwrap().payload, "old");
        assert_eq!(
            report.outcome_for("alice"),
            Some(&Outcome::Secured {
                user: "alice".into(),
                servers: vec!["https://b.example".into()],
            })
        );
        assert_eq!(
            report.outcome_for("bob"),
            Some(&Outcome::Skipped { user: "bob".into(), reason: SkipReason::NotSelected })
        );
        assert!(cfg.auth_info("bob").unwrap().has_sensitive_data());
        assert!(prompter.asked[1].contains("already found"));
    }

    #[test]
    fn user_is_untouched_when_nothing_was_stored() {
        let vault = MemoryVault::new(DEFAULT_SERVICE);
        let mut prompter = ScriptedPrompter::new([false, false]);
        let mut logger = MemoryLogger::default();
        let mut cfg = config();
        let before = cfg.clone();

        let report = Securer::new(&vault, &mut prompter, &mut logger, HELPER)
            .secure(&mut cfg, Some("alice"))
            .unwrap();

        assert_eq!(
            report.outcome_for("alice"),
            Some(&Outcome::Skipped { user: "alice".into(), reason: SkipReason::NothingStored })
        );
        assert_eq!(cfg, before);
        assert_eq!(vault.writes(), 0);
    }

    #[test]
    fn foreign_record_under_same_key_is_skipped() {
        let vault = MemoryVault::new(DEFAULT_SERVICE);
        vault.insert_raw("other-tool", "x", "https://a.example", "theirs");
        let mut prompter = AssumeYes;
        let mut logger = MemoryLogger::default();
        let mut cfg = config();

        let report = Securer::new(&vault, &mut prompter, &mut logger, HELPER)
            .secure(&mut cfg, Some("alice"))
            .unwrap();

        assert_eq!(
            report.outcome_for("alice"),
            Some(&Outcome::Secured {
                user: "alice".into(),
                servers: vec!["https://b.example".into()],
            })
        );
        assert!(logger.lines.iter().any(|l| l.contains("not created by this helper")));
    }

    #[test]
    fn backend_failure_aborts_the_run() {
        let vault = MemoryVault::new(DEFAULT_SERVICE);
        vault.set_unavailable(Some("collection is locked"));
        let mut prompter = AssumeYes;
        let mut logger = MemoryLogger::default();
        let mut cfg = config();

        let err = Securer::new(&vault, &mut prompter, &mut logger, HELPER)
            .secure(&mut cfg, None)
            .unwrap_err();
        assert!(matches!(err, HelperError::Vault(VaultError::Backend(_))));
        assert_eq!(vault.open_sessions(), 0);
    }
}
