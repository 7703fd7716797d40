//! Error types shared by every packaging stage.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while loading and validating the plug-in configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The plug-in key is not a dotted namespace such as `com.example.plugin`.
    #[error("invalid plugin key {0:?}: expected a dotted namespace")]
    InvalidPluginKey(String),

    #[error("{collection} entry #{index} has an empty Key")]
    EmptyEntityKey { collection: &'static str, index: usize },

    #[error("duplicate Key {key:?} in {collection}")]
    DuplicateEntityKey { collection: &'static str, key: String },

    #[error("JarFile must not be empty")]
    EmptyJarFile,
}

/// Failure of an external tool invocation (`javac`, `jar`).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("failed to launch {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while uploading the archive.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to read archive {path:?}: {source}")]
    ReadArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no deploy API key: set Deploy.ApiKey or APPIAN_API_KEY")]
    MissingApiKey,

    #[error("deployment rejected by {url}: {status}")]
    Rejected { url: String, status: String },
}

/// Top-level error for a packaging stage.
#[derive(Debug, Error)]
pub enum PackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl PackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for packaging operations.
pub type PackResult<T> = Result<T, PackError>;
