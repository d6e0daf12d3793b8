use crate::core::types::ActorId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("Failed to read config '{path:?}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error in '{path:?}': {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid config: {0}")]
    ConfigValidation(String),

    #[error("No config source has been loaded yet")]
    NoConfigSource,

    #[error("Actor already in casting mode: {0}")]
    AlreadyActive(ActorId),

    #[error("No class selected for actor: {0}")]
    NoClassSelected(ActorId),

    #[error("Casting engine requires a running tokio runtime")]
    NoRuntime,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CastError>;
