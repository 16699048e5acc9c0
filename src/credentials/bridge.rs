// src/credentials/bridge.rs
use std::io::Write;

use crate::error::HelperError;
use crate::kubeconfig::codec;
use crate::utils::logging::{mask_secret, Logger};
use crate::vault::SecretVault;

use super::exec::{ExecCredential, ExecCredentialStatus};

/// Answers kubectl's exec credential request from the vault. Nothing but
/// the final response is written to stdout; notes go to the logger's
/// debug channel.
pub struct CredentialBridge<'a> {
    vault: &'a dyn SecretVault,
    logger: &'a mut dyn Logger,
}

impl<'a> CredentialBridge<'a> {
    pub fn new(vault: &'a dyn SecretVault, logger: &'a mut dyn Logger) -> Self {
        Self { vault, logger }
    }

    pub fn answer(&mut self, request: &ExecCredential) -> Result<ExecCredential, HelperError> {
        let server = request.server()?;
        self.logger.debug_log(&format!("cluster endpoint: {}", server));

        let record = self.vault.get(server)?;
        self.logger.debug_log(&format!("found secret {}", record.label));

        let fragment = codec::decode_base64(&record.payload).map_err(|source| HelperError::Payload {
            key: server.to_string(),
            source,
        })?;
        let auth = fragment
            .credential_user(&record.label)
            .ok_or_else(|| HelperError::MissingUser {
                key: server.to_string(),
                label: record.label.clone(),
            })?;

        let decode = |value: &Option<String>| -> Result<String, HelperError> {
            match value.as_deref() {
                Some(data) if !data.is_empty() => {
                    codec::decode_data_field(data).map_err(|source| HelperError::Payload {
                        key: server.to_string(),
                        source,
                    })
                }
                _ => Ok(String::new()),
            }
        };
        let status = ExecCredentialStatus {
            client_certificate_data: decode(&auth.client_certificate_data)?,
            client_key_data: decode(&auth.client_key_data)?,
        };
        if status.client_certificate_data.is_empty() || status.client_key_data.is_empty() {
            return Err(HelperError::NoClientCertificate {
                key: server.to_string(),
            });
        }
        self.logger.debug_log(&format!(
            "client certificate {}",
            mask_secret(&status.client_certificate_data)
        ));

        Ok(request.respond(status))
    }

    /// Parses `raw`, answers it and writes the response to `out` once.
    pub fn run<W: Write>(&mut self, raw: &str, out: &mut W) -> Result<(), HelperError> {
        let request = ExecCredential::parse(raw)?;
        let response = self.answer(&request)?;
        let data = serde_json::to_string(&response).map_err(HelperError::Response)?;
        writeln!(out, "{}", data).map_err(HelperError::Output)?;
        out.flush().map_err(HelperError::Output)
    }
}
