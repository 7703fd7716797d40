#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use appian_pack::config::PluginConfig;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A project directory holding a copy of the shipped templates.
pub fn project_with_templates() -> TempDir {
    let project = tempfile::tempdir().expect("temp project dir");
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    let target = project.path().join("templates");
    fs::create_dir_all(&target).unwrap();
    for entry in fs::read_dir(&source).expect("templates dir exists") {
        let entry = entry.unwrap();
        fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
    }
    project
}

/// The smallest valid configuration for `key`.
pub fn config_json(key: &str) -> Value {
    json!({
        "Key": key,
        "Name": "Acme Tools",
        "JarFile": "plugin.jar",
        "Deploy": { "Url": "http://127.0.0.1:9/deploy", "ApiKey": "file-key" },
        "Functions": [],
        "SmartServices": [],
        "ConnectedSystems": [],
        "FunctionCategories": []
    })
}

pub fn write_config(dir: &Path, config: &Value) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    path
}

pub fn plugin_config(config: Value) -> PluginConfig {
    let parsed: PluginConfig = serde_json::from_value(config).expect("valid config");
    parsed.validate().expect("config passes validation");
    parsed
}

/// Names of the entries directly inside `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
