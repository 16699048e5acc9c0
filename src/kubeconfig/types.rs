// src/kubeconfig/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Fields this tool does not interpret. They ride along untouched so a
/// rewritten kubeconfig keeps CA data, namespaces, tokens and the like.
pub type Extra = BTreeMap<String, serde_yaml::Value>;

pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1";
pub const INTERACTIVE_MODE_NEVER: &str = "Never";

/// client-go writes `clusters: null` and `user: null` for empty values.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<NamedAuthInfo>,
    #[serde(rename = "current-context", default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub server: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: Context,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedAuthInfo {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: AuthInfo,
}

/// Credential entry. The `*-data` fields hold base64 text exactly as it
/// appears in the kubeconfig file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(rename = "client-certificate-data", default, skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data", default, skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<ExecEnvVar>>,
    #[serde(default)]
    pub provide_cluster_info: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_mode: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

/// The part of an [`AuthInfo`] that gets moved into the vault.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitiveFields {
    pub client_certificate_data: Option<String>,
    pub client_key_data: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

impl ExecConfig {
    /// Exec descriptor that hands credential lookups to `command`.
    pub fn delegate_to(command: &str) -> Self {
        Self {
            api_version: EXEC_API_VERSION.to_string(),
            command: command.to_string(),
            args: None,
            env: None,
            provide_cluster_info: true,
            interactive_mode: Some(INTERACTIVE_MODE_NEVER.to_string()),
            extra: Extra::new(),
        }
    }
}

impl AuthInfo {
    pub fn has_sensitive_data(&self) -> bool {
        present(&self.client_certificate_data)
            || present(&self.client_key_data)
            || present(&self.username)
            || present(&self.password)
    }

    pub fn sensitive_fields(&self) -> SensitiveFields {
        SensitiveFields {
            client_certificate_data: non_empty(&self.client_certificate_data),
            client_key_data: non_empty(&self.client_key_data),
            username: non_empty(&self.username),
            password: non_empty(&self.password),
        }
    }

    pub fn clear_sensitive_data(&mut self) {
        self.client_certificate_data = None;
        self.client_key_data = None;
        self.username = None;
        self.password = None;
    }

    pub fn restore_sensitive_data(&mut self, fields: SensitiveFields) {
        self.client_certificate_data = fields.client_certificate_data;
        self.client_key_data = fields.client_key_data;
        self.username = fields.username;
        self.password = fields.password;
    }

    /// True when the exec command is `executable` or a longer path ending
    /// in it.
    pub fn is_delegated_to(&self, executable: &str) -> bool {
        match &self.exec {
            Some(exec) if !executable.is_empty() => {
                exec.command == executable || exec.command.ends_with(executable)
            }
            _ => false,
        }
    }
}

impl From<SensitiveFields> for AuthInfo {
    fn from(fields: SensitiveFields) -> Self {
        let mut auth = AuthInfo::default();
        auth.restore_sensitive_data(fields);
        auth
    }
}

/// A cluster reached from a user through one of its contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedCluster {
    pub context: String,
    pub cluster: String,
    pub server: String,
}

impl KubeConfig {
    pub fn auth_info(&self, name: &str) -> Option<&AuthInfo> {
        self.users.iter().find(|u| u.name == name).map(|u| &u.user)
    }

    pub fn auth_info_mut(&mut self, name: &str) -> Option<&mut AuthInfo> {
        self.users
            .iter_mut()
            .find(|u| u.name == name)
            .map(|u| &mut u.user)
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.cluster)
    }

    pub fn user_names(&self) -> Vec<String> {
        self.users.iter().map(|u| u.name.clone()).collect()
    }

    /// Follows user -> contexts -> clusters. Contexts pointing at a cluster
    /// that does not exist are dropped.
    pub fn clusters_for_user(&self, user: &str) -> Vec<LinkedCluster> {
        self.contexts
            .iter()
            .filter(|ctx| ctx.context.user == user)
            .filter_map(|ctx| {
                self.cluster(&ctx.context.cluster).map(|cluster| LinkedCluster {
                    context: ctx.name.clone(),
                    cluster: ctx.context.cluster.clone(),
                    server: cluster.server.clone(),
                })
            })
            .collect()
    }

    /// The user a vault fragment was stored for: the one named `label`, or
    /// the only user when the fragment holds exactly one.
    pub fn credential_user(&self, label: &str) -> Option<&AuthInfo> {
        self.auth_info(label).or(match self.users.as_slice() {
            [only] => Some(&only.user),
            _ => None,
        })
    }

    /// Single-user document holding only `fields`, used as a vault payload.
    pub fn fragment(&self, user: &str, fields: SensitiveFields) -> KubeConfig {
        KubeConfig {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            users: vec![NamedAuthInfo {
                name: user.to_string(),
                user: AuthInfo::from(fields),
            }],
            ..KubeConfig::default()
        }
    }
}
