// src/kubeconfig/codec.rs
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use super::KubeConfig;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid kubeconfig document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded data is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub fn encode(config: &KubeConfig) -> Result<Vec<u8>, CodecError> {
    Ok(serde_yaml::to_string(config)?.into_bytes())
}

pub fn decode(bytes: &[u8]) -> Result<KubeConfig, CodecError> {
    Ok(serde_yaml::from_slice(bytes)?)
}

/// Text form used for vault payloads.
pub fn encode_base64(config: &KubeConfig) -> Result<String, CodecError> {
    Ok(general_purpose::STANDARD.encode(encode(config)?))
}

pub fn decode_base64(text: &str) -> Result<KubeConfig, CodecError> {
    let bytes = general_purpose::STANDARD.decode(text.trim())?;
    decode(&bytes)
}

/// Turns a kubeconfig `*-data` field into the PEM text it wraps.
pub fn decode_data_field(value: &str) -> Result<String, CodecError> {
    let bytes = general_purpose::STANDARD.decode(value.trim())?;
    Ok(String::from_utf8(bytes)?)
}
