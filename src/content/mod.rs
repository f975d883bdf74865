pub mod migrate;
pub mod registry;
pub mod shapes;

pub use registry::SectionKind;

/// Errors from section payload validation and migration
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("unknown section kind: {0}")]
    UnknownKind(String),

    #[error("invalid payload for section kind '{kind}': {message}")]
    InvalidShape { kind: String, message: String },

    #[error("section kind '{kind}' has no schema version {version}")]
    UnknownVersion { kind: String, version: i32 },
}
