//! Typed errors for the container codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[error("invalid utf-8 in length-prefixed string")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("failed to match file magic")]
    BadMagic,

    #[error("failed to recognize file as a compiled material definition")]
    NotAMaterial,

    #[error("unsupported material version {0}")]
    UnsupportedVersion(u64),

    #[error("material is encrypted ({scheme}); decryption is out of scope")]
    Encrypted { scheme: String },

    #[error("unknown encryption tag {0:?}")]
    UnknownEncryption(String),

    #[error("unknown {kind} value {value}")]
    UnknownEnum { kind: &'static str, value: u32 },

    #[error("unknown {kind} name {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("{kind} name {name:?} maps to index {expected}, file carries {found}")]
    IndexMismatch {
        kind: &'static str,
        name: String,
        expected: u8,
        found: u8,
    },

    #[error("unrecognized shader payload header {0:?}")]
    BadShaderHeader(String),

    #[error("unsupported shader payload version {0}")]
    BadShaderVersion(u8),

    #[error("sampler state value {0} out of range")]
    BadSamplerState(u8),

    #[error("malformed unpacked material: {0}")]
    MalformedUnpacked(String),

    #[error("failed to parse json")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MaterialError>;
