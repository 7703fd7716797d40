//! Project directory layout and the output workspace reset.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::PluginConfig;
use crate::error::{PackError, PackResult};

/// Every fixed path the tool reads or writes, resolved against one project directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    /// Main plug-in sources.
    pub fn java_dir(&self) -> PathBuf {
        self.root.join("java")
    }

    /// Sources of dependencies that are not available as jars.
    pub fn missing_dir(&self) -> PathBuf {
        self.root.join("missing")
    }

    pub fn libs_dir(&self) -> PathBuf {
        self.root.join("libs")
    }

    pub fn missing_jar(&self) -> PathBuf {
        self.libs_dir().join("missing.jar")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Namespace-derived resource directory inside the output directory.
    pub fn resources_dir(&self, config: &PluginConfig) -> PathBuf {
        self.out_dir().join(config.namespace_dir())
    }

    pub fn archive_path(&self, config: &PluginConfig) -> PathBuf {
        self.root.join(&config.jar_file)
    }
}

/// Deletes `dir` if present and recreates it empty.
pub fn recreate_dir(dir: &Path) -> PackResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| {
            error!(error = ?e, path = %dir.display(), "Failed to remove directory");
            PackError::io(dir, e)
        })?;
        debug!(path = %dir.display(), "Removed directory");
    }
    fs::create_dir_all(dir).map_err(|e| {
        error!(error = ?e, path = %dir.display(), "Failed to create directory");
        PackError::io(dir, e)
    })?;
    Ok(())
}

/// Clears the output workspace. Safe to call when it does not exist yet.
pub fn reset_workspace(layout: &ProjectLayout) -> PackResult<()> {
    let out = layout.out_dir();
    recreate_dir(&out)?;
    info!(path = %out.display(), "Output workspace reset");
    Ok(())
}
