//! Template rendering on top of `minijinja`.
//!
//! Templates are read from the project's `templates/` directory and rendered
//! with strict undefined behaviour: a template referring to a field the
//! context does not carry fails instead of rendering an empty string.
//! Block tags swallow their own line (`trim_blocks` + `lstrip_blocks`).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error};

use crate::error::{PackError, PackResult};

pub const PLUGIN_DESCRIPTOR_TEMPLATE: &str = "appian-plugin.xml";
pub const PROPERTIES_TEMPLATE: &str = "_en_US.properties";
pub const DOCUMENTATION_TEMPLATE: &str = "documentation.html";

pub struct TemplateRenderer {
    env: Environment<'static>,
    templates_dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self {
            env,
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Renders `template` (a file name under the templates directory) with `ctx`.
    pub fn render<S: Serialize>(&self, template: &str, ctx: S) -> PackResult<String> {
        let path = self.templates_dir.join(template);
        let source = fs::read_to_string(&path).map_err(|e| {
            error!(error = ?e, template = %path.display(), "Failed to read template");
            PackError::Render {
                template: template.to_string(),
                message: format!("cannot read {}: {e}", path.display()),
            }
        })?;
        self.render_source(template, &source, ctx)
    }

    /// Renders an in-memory template source.
    pub fn render_source<S: Serialize>(
        &self,
        name: &str,
        source: &str,
        ctx: S,
    ) -> PackResult<String> {
        self.env
            .render_named_str(name, source, ctx)
            .map_err(|e| {
                error!(error = %e, template = name, "Template rendering failed");
                PackError::Render {
                    template: name.to_string(),
                    message: e.to_string(),
                }
            })
    }

    /// Renders `template` into `output`.
    ///
    /// The text is staged in a temporary file beside `output` and only moved
    /// into place once rendering and writing succeeded, so a failure leaves
    /// no partial file behind.
    pub fn render_to_file<S: Serialize>(
        &self,
        template: &str,
        ctx: S,
        output: &Path,
    ) -> PackResult<()> {
        let rendered = self.render(template, ctx)?;
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| PackError::io(dir, e))?;
        staged
            .write_all(rendered.as_bytes())
            .map_err(|e| PackError::io(staged.path().to_path_buf(), e))?;
        staged.persist(output).map_err(|e| {
            error!(error = ?e.error, path = %output.display(), "Failed to persist rendered file");
            PackError::io(output, e.error)
        })?;

        debug!(template, path = %output.display(), bytes = rendered.len(), "Rendered template");
        Ok(())
    }
}

/// Wraps `value` under a single variable name.
pub fn keyed<'a, T: Serialize>(
    key: &'static str,
    value: &'a T,
) -> BTreeMap<&'static str, &'a T> {
    let mut ctx = BTreeMap::new();
    ctx.insert(key, value);
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Entity;

    #[test]
    fn strict_undefined_is_an_error() {
        let renderer = TemplateRenderer::new("unused");
        let entity = Entity::new("addOne");
        let err = renderer
            .render_source("t", "{{ Function.Missing }}", keyed("Function", &entity))
            .unwrap_err();
        assert!(matches!(err, PackError::Render { .. }), "got {err:?}");
    }

    #[test]
    fn trailing_newline_is_kept() {
        let renderer = TemplateRenderer::new("unused");
        let entity = Entity::new("addOne");
        let out = renderer
            .render_source("t", "key={{ Function.Key }}\n", keyed("Function", &entity))
            .unwrap();
        assert_eq!(out, "key=addOne\n");
    }
}
