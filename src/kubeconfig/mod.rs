pub mod codec;
pub mod file;
mod types;

pub use codec::CodecError;
pub use types::{
    AuthInfo, Cluster, Context, ExecConfig, ExecEnvVar, Extra, KubeConfig, LinkedCluster,
    NamedAuthInfo, NamedCluster, NamedContext, SensitiveFields, EXEC_API_VERSION,
    INTERACTIVE_MODE_NEVER,
};
