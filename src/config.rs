//! Strongly typed plug-in configuration.
//!
//! The on-disk schema keeps the PascalCase keys of `config.json`. Fields the
//! schema does not name (plug-in `Name`, `Vendor`, entity descriptions, ...)
//! are retained verbatim so templates can reach them.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ConfigError;

static PLUGIN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("plugin key pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginConfig {
    /// Dotted namespace of the plug-in, e.g. `com.example.plugin`.
    pub key: String,
    /// Archive written by `build` and uploaded by `deploy`.
    pub jar_file: String,
    pub deploy: DeployConfig,
    #[serde(default)]
    pub functions: Vec<Entity>,
    #[serde(default)]
    pub smart_services: Vec<Entity>,
    #[serde(default)]
    pub connected_systems: Vec<Entity>,
    #[serde(default)]
    pub function_categories: Vec<Entity>,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployConfig {
    pub url: String,
    // Kept out of template contexts so the key never lands in generated files.
    // May be absent when `APPIAN_API_KEY` supplies it.
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

/// External tool names, overridable for toolchains outside PATH.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildConfig {
    #[serde(default = "default_javac")]
    pub javac: String,
    #[serde(default = "default_jar")]
    pub jar: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            javac: default_javac(),
            jar: default_jar(),
        }
    }
}

fn default_javac() -> String {
    "javac".to_string()
}

fn default_jar() -> String {
    "jar".to_string()
}

/// One record of an entity collection. Only `Key` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }
}

/// The entity collections of a configuration, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Functions,
    SmartServices,
    ConnectedSystems,
    FunctionCategories,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Functions,
        Collection::SmartServices,
        Collection::ConnectedSystems,
        Collection::FunctionCategories,
    ];

    /// Name of the collection in the configuration file.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Functions => "Functions",
            Collection::SmartServices => "SmartServices",
            Collection::ConnectedSystems => "ConnectedSystems",
            Collection::FunctionCategories => "FunctionCategories",
        }
    }

    /// Variable under which the properties template receives the entity.
    pub fn context_key(self) -> &'static str {
        match self {
            Collection::Functions => "Function",
            Collection::SmartServices => "SmartService",
            Collection::ConnectedSystems => "ConnectedSystem",
            Collection::FunctionCategories => "FunctionCategory",
        }
    }
}

impl PluginConfig {
    pub fn entities(&self, collection: Collection) -> &[Entity] {
        match collection {
            Collection::Functions => &self.functions,
            Collection::SmartServices => &self.smart_services,
            Collection::ConnectedSystems => &self.connected_systems,
            Collection::FunctionCategories => &self.function_categories,
        }
    }

    /// Resource directory of the plug-in, relative to the output directory.
    pub fn namespace_dir(&self) -> PathBuf {
        namespace_path(&self.key)
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_plugin_key(&self.key) {
            return Err(ConfigError::InvalidPluginKey(self.key.clone()));
        }
        if self.jar_file.trim().is_empty() {
            return Err(ConfigError::EmptyJarFile);
        }
        for collection in Collection::ALL {
            let mut seen = HashSet::new();
            for (index, entity) in self.entities(collection).iter().enumerate() {
                if entity.key.is_empty() {
                    return Err(ConfigError::EmptyEntityKey {
                        collection: collection.name(),
                        index,
                    });
                }
                if !seen.insert(entity.key.as_str()) {
                    return Err(ConfigError::DuplicateEntityKey {
                        collection: collection.name(),
                        key: entity.key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            plugin_key = %self.key,
            jar_file = %self.jar_file,
            functions = self.functions.len(),
            smart_services = self.smart_services.len(),
            connected_systems = self.connected_systems.len(),
            function_categories = self.function_categories.len(),
            "Loaded plugin config"
        );
        debug!(deploy_url = %self.deploy.url, javac = %self.build.javac, jar = %self.build.jar, "Config loaded (details)");
    }
}

/// Maps a dotted plug-in key to a relative directory: `a.b.c` -> `a/b/c`.
pub fn namespace_path(key: &str) -> PathBuf {
    key.split('.').collect()
}

pub fn is_valid_plugin_key(key: &str) -> bool {
    PLUGIN_KEY.is_match(key)
}
