// src/credentials/exec.rs
//! The `ExecCredential` document kubectl exchanges with exec plugins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

pub const EXEC_INFO_ENV: &str = "KUBERNETES_EXEC_INFO";
pub const EXEC_CREDENTIAL_KIND: &str = "ExecCredential";
pub const SUPPORTED_API_VERSIONS: [&str; 2] = [
    "client.authentication.k8s.io/v1",
    "client.authentication.k8s.io/v1beta1",
];

#[derive(Debug, Error)]
pub enum ExecCredentialError {
    #[error("{0} is not set; run this command as a kubectl exec plugin")]
    MissingEnv(&'static str),
    #[error("malformed exec credential request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported exec credential apiVersion {0:?}")]
    UnsupportedVersion(String),
    #[error("exec credential request carries no cluster, set provideClusterInfo: true")]
    MissingCluster,
    #[error("empty cluster endpoint in the request")]
    EmptyServer,
    #[error("invalid cluster endpoint {server:?}: {source}")]
    InvalidServer {
        server: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredential {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub spec: ExecCredentialSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecCredentialStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecCredentialSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ExecCluster>,
    #[serde(default)]
    pub interactive: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecCluster {
    #[serde(default)]
    pub server: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredentialStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_certificate_data: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_key_data: String,
}

impl ExecCredential {
    pub fn from_env() -> Result<Self, ExecCredentialError> {
        let raw = std::env::var(EXEC_INFO_ENV)
            .map_err(|_| ExecCredentialError::MissingEnv(EXEC_INFO_ENV))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ExecCredentialError> {
        if raw.trim().is_empty() {
            return Err(ExecCredentialError::MissingEnv(EXEC_INFO_ENV));
        }
        let mut credential: ExecCredential = serde_json::from_str(raw)?;
        if !SUPPORTED_API_VERSIONS.contains(&credential.api_version.as_str()) {
            return Err(ExecCredentialError::UnsupportedVersion(credential.api_version));
        }
        if credential.kind.is_empty() {
            credential.kind = EXEC_CREDENTIAL_KIND.to_string();
        }
        Ok(credential)
    }

    /// Cluster endpoint the request is for; must be a non-empty absolute URL.
    pub fn server(&self) -> Result<&str, ExecCredentialError> {
        let cluster = self
            .spec
            .cluster
            .as_ref()
            .ok_or(ExecCredentialError::MissingCluster)?;
        let server = cluster.server.trim();
        if server.is_empty() {
            return Err(ExecCredentialError::EmptyServer);
        }
        Url::parse(server).map_err(|source| ExecCredentialError::InvalidServer {
            server: server.to_string(),
            source,
        })?;
        Ok(server)
    }

    /// The request echoed back with `status` filled in, same schema version.
    pub fn respond(&self, status: ExecCredentialStatus) -> ExecCredential {
        ExecCredential {
            status: Some(status),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "kind": "ExecCredential",
        "apiVersion": "client.authentication.k8s.io/v1",
        "spec": {
            "cluster": {
                "server": "https://a.example",
                "certificate-authority-data": "Q0E=",
                "config": null
            },
            "interactive": false
        }
    }"#;

    #[test]
    fn parses_request_and_keeps_cluster_extras() {
        let request = ExecCredential::parse(REQUEST).unwrap();
        assert_eq!(request.server().unwrap(), "https://a.example");
        let cluster = request.spec.cluster.as_ref().unwrap();
        assert!(cluster.extra.contains_key("certificate-authority-data"));
    }

    #[test]
    fn response_uses_request_version_and_camel_case_status() {
        let request = ExecCredential::parse(REQUEST).unwrap();
        let response = request.respond(ExecCredentialStatus {
            client_certificate_data: "CERT".into(),
            client_key_data: "KEY".into(),
        });
        let json: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(json["apiVersion"], "client.authentication.k8s.io/v1");
        assert_eq!(json["kind"], "ExecCredential");
        assert_eq!(json["status"]["clientCertificateData"], "CERT");
        assert_eq!(json["status"]["clientKeyData"], "KEY");
        assert_eq!(json["spec"]["cluster"]["server"], "https://a.example");
    }

    #[test]
    fn rejects_bad_requests() {
        assert!(matches!(
            ExecCredential::parse("{not json"),
            Err(ExecCredentialError::Json(_))
        ));
        assert!(matches!(
            ExecCredential::parse(r#"{"apiVersion":"client.authentication.k8s.io/v1alpha1"}"#),
            Err(ExecCredentialError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            ExecCredential::parse(""),
            Err(ExecCredentialError::MissingEnv(_))
        ));

        let no_cluster =
            ExecCredential::parse(r#"{"apiVersion":"client.authentication.k8s.io/v1"}"#).unwrap();
        assert!(matches!(no_cluster.server(), Err(ExecCredentialError::MissingCluster)));

        let empty = ExecCredential::parse(
            r#"{"apiVersion":"client.authentication.k8s.io/v1","spec":{"cluster":{"server":""}}}"#,
        )
        .unwrap();
        assert!(matches!(empty.server(), Err(ExecCredentialError::EmptyServer)));

        let relative = ExecCredential::parse(
            r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","spec":{"cluster":{"server":"a.example"}}}"#,
        )
        .unwrap();
        assert_eq!(relative.kind, EXEC_CREDENTIAL_KIND);
        assert!(matches!(relative.server(), Err(ExecCredentialError::InvalidServer { .. })));
    }

    #[test]
    fn from_env_requires_variable() {
        temp_env::with_var_unset(EXEC_INFO_ENV, || {
            assert!(matches!(
                ExecCredential::from_env(),
                Err(ExecCredentialError::MissingEnv(EXEC_INFO_ENV))
            ));
        });
        temp_env::with_var(EXEC_INFO_ENV, Some(REQUEST), || {
            assert_eq!(ExecCredential::from_env().unwrap().server().unwrap(), "https://a.example");
        });
    }
}
