mod discovery;
mod types;

pub use discovery::{find_kubeconfig, KUBECONFIG_ENV};
pub use types::{HelperConfig, CONFIG_FILE_NAME};
