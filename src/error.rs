use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SetupError {
    #[error("download request failed: {0}")]
    Http(String),

    #[error("download failed with status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("archive not found: {0}")]
    ArchiveMissing(PathBuf),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("generation script not found: {0}")]
    GeneratorMissing(PathBuf),

    #[error("failed to launch project generator: {0}")]
    GeneratorSpawn(String),

    #[error("project generator exited with status {status}")]
    GeneratorExit { status: String, stderr: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing bundle URL: set bundle_url in prism-setup.json or pass --url")]
    MissingBundleUrl,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
