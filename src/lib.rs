//! Keeps kubeconfig client credentials in the platform secret store.
//!
//! `secure` moves client certificates, keys and basic-auth credentials of
//! each kubeconfig user into the vault and rewrites the user to call this
//! binary as an exec credential plugin. `undo` reverses that. Run with no
//! subcommand, the binary answers kubectl's `ExecCredential` request from
//! the vault.

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod kubeconfig;
pub mod utils;
pub mod vault;

pub use error::HelperError;
