//! Turns the configuration's entity collections into plug-in resource files.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{Collection, PluginConfig};
use crate::error::{PackError, PackResult};
use crate::render::{
    keyed, TemplateRenderer, DOCUMENTATION_TEMPLATE, PLUGIN_DESCRIPTOR_TEMPLATE,
    PROPERTIES_TEMPLATE,
};
use crate::workspace::{recreate_dir, ProjectLayout};

/// File names of the fixed, single-instance outputs.
pub const PLUGIN_DESCRIPTOR_FILE: &str = "appian-plugin.xml";
pub const CONNECTED_SYSTEMS_FILE: &str = "resources_en_US.properties";
pub const DOCUMENTATION_FILE: &str = "documentation.html";

/// Files written by one generation pass, in write order.
#[derive(Debug, Default, Clone)]
pub struct GenerationReport {
    pub files: Vec<PathBuf>,
}

/// Name of the localized properties file of an entity.
pub fn properties_file_name(entity_key: &str) -> String {
    format!("{entity_key}_en_US.properties")
}

/// Renders the plug-in descriptor and one properties file per entity.
///
/// Collections are visited in [`Collection::ALL`] order. Connected systems
/// share a single properties file at the output root, rendered with the
/// whole configuration under `ConnectedSystem`.
pub fn generate_resources(
    config: &PluginConfig,
    layout: &ProjectLayout,
    renderer: &TemplateRenderer,
) -> PackResult<GenerationReport> {
    let mut report = GenerationReport::default();
    let resources_dir = layout.resources_dir(config);
    recreate_dir(&resources_dir)?;
    info!(path = %resources_dir.display(), "Resource directory ready");

    let descriptor = layout.out_dir().join(PLUGIN_DESCRIPTOR_FILE);
    renderer.render_to_file(PLUGIN_DESCRIPTOR_TEMPLATE, config, &descriptor)?;
    report.files.push(descriptor);

    for collection in Collection::ALL {
        let entities = config.entities(collection);
        if entities.is_empty() {
            debug!(collection = collection.name(), "Collection empty, nothing to render");
            continue;
        }

        if collection == Collection::ConnectedSystems {
            let output = layout.out_dir().join(CONNECTED_SYSTEMS_FILE);
            renderer.render_to_file(
                PROPERTIES_TEMPLATE,
                keyed(collection.context_key(), config),
                &output,
            )?;
            report.files.push(output);
        } else {
            for entity in entities {
                let output = resources_dir.join(properties_file_name(&entity.key));
                renderer.render_to_file(
                    PROPERTIES_TEMPLATE,
                    keyed(collection.context_key(), entity),
                    &output,
                )?;
                report.files.push(output);
            }
        }
        info!(
            collection = collection.name(),
            entities = entities.len(),
            "Rendered collection properties"
        );
    }

    info!(files = report.files.len(), "Resource generation complete");
    Ok(report)
}

/// Renders the documentation page into the output directory.
pub fn generate_documentation(
    config: &PluginConfig,
    layout: &ProjectLayout,
    renderer: &TemplateRenderer,
) -> PackResult<PathBuf> {
    let out_dir = layout.out_dir();
    fs::create_dir_all(&out_dir).map_err(|e| PackError::io(&out_dir, e))?;
    let output = out_dir.join(DOCUMENTATION_FILE);
    renderer.render_to_file(DOCUMENTATION_TEMPLATE, config, &output)?;
    info!(path = %output.display(), "Documentation rendered");
    Ok(output)
}
