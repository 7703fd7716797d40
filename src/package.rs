//! Compiles the plug-in sources and packages the output workspace into a jar.
//!
//! The build runs in two phases:
//! - **missing**: sources of dependencies that ship without a jar are compiled
//!   in place and archived as `libs/missing.jar`. Failures are logged and the
//!   main phase still runs.
//! - **main**: plug-in sources are compiled into `out/`, copied to `out/src`
//!   and the whole workspace is archived as the configured `JarFile`.
//!
//! Source lists are handed to `javac` through `@manifest` files that live
//! exactly as long as their phase.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::{BuildConfig, PluginConfig};
use crate::error::{PackError, PackResult, ToolError};
use crate::workspace::ProjectLayout;

pub const SOURCE_EXTENSION: &str = "java";
pub const MANIFEST_PREFIX: &str = "javac-sources-";

/// The archive produced by the main build phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveArtifact {
    pub path: PathBuf,
}

impl ArchiveArtifact {
    /// Name sent to the deployment endpoint.
    pub fn document_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` with `args` and checks its exit status.
///
/// Paths in `args` are taken relative to the current directory, like every
/// path of a [`ProjectLayout`].
pub fn run_tool<I, S>(program: &str, args: I) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!(program, "Launching tool");

    let output = match command.output() {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!(program, "Tool not found on PATH");
            return Err(ToolError::NotFound {
                program: program.to_string(),
            });
        }
        Err(e) => {
            error!(error = ?e, program, "Failed to launch tool");
            return Err(ToolError::Io {
                program: program.to_string(),
                source: e,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    for line in stdout.lines() {
        info!(tool = program, "{line}");
    }

    if output.status.success() {
        Ok(ToolOutput { stdout, stderr })
    } else {
        error!(program, status = %output.status, stderr = %stderr.trim_end(), "Tool exited with non-zero status");
        Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status,
            stdout,
            stderr,
        })
    }
}

/// All files under `dir` with the source extension, sorted by path.
pub fn collect_sources(dir: &Path) -> PackResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PackError::io(path, io::Error::other(e))
        })?;
        let is_source = entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION);
        if is_source {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

/// Quotes a path for a javac `@argfile`, which splits unquoted entries on whitespace.
fn quote_argfile_entry(path: &Path) -> String {
    let raw = path.display().to_string();
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Writes the source list to a temporary manifest in `dir`.
///
/// The manifest is removed when the returned handle drops.
pub fn write_manifest(dir: &Path, sources: &[PathBuf]) -> PackResult<NamedTempFile> {
    let mut manifest = tempfile::Builder::new()
        .prefix(MANIFEST_PREFIX)
        .suffix(".txt")
        .tempfile_in(dir)
        .map_err(|e| PackError::io(dir, e))?;
    for source in sources {
        writeln!(manifest, "{}", quote_argfile_entry(source))
            .map_err(|e| PackError::io(manifest.path().to_path_buf(), e))?;
    }
    manifest
        .flush()
        .map_err(|e| PackError::io(manifest.path().to_path_buf(), e))?;
    debug!(path = %manifest.path().display(), sources = sources.len(), "Wrote source manifest");
    Ok(manifest)
}

/// Recursively copies `from` into `to`, creating directories as needed.
pub fn copy_tree(from: &Path, to: &Path) -> PackResult<u64> {
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            PackError::io(path, io::Error::other(e))
        })?;
        let relative = entry.path().strip_prefix(from).map_err(|e| {
            PackError::io(entry.path(), io::Error::new(io::ErrorKind::InvalidInput, e))
        })?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PackError::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| PackError::io(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Drives `javac` and `jar` over a project layout.
pub struct Packager<'a> {
    layout: &'a ProjectLayout,
    tools: &'a BuildConfig,
}

impl<'a> Packager<'a> {
    pub fn new(layout: &'a ProjectLayout, tools: &'a BuildConfig) -> Self {
        Self { layout, tools }
    }

    fn classpath(&self) -> String {
        format!("{}/*", self.layout.libs_dir().display())
    }

    /// Compiles `sources` through a manifest; the manifest is gone when this returns.
    fn compile(&self, sources: &[PathBuf], destination: Option<&Path>) -> PackResult<()> {
        let manifest = write_manifest(self.layout.root(), sources)?;
        let mut args = vec!["-cp".to_string(), self.classpath()];
        if let Some(dest) = destination {
            args.push("-d".to_string());
            args.push(dest.display().to_string());
        }
        args.push(format!("@{}", manifest.path().display()));

        let result = run_tool(&self.tools.javac, &args);
        drop(manifest);
        result?;
        Ok(())
    }

    fn archive(&self, jar: &Path, contents: &Path) -> PackResult<()> {
        let args = [
            "cvf".to_string(),
            jar.display().to_string(),
            "-C".to_string(),
            contents.display().to_string(),
            ".".to_string(),
        ];
        run_tool(&self.tools.jar, &args)?;
        Ok(())
    }

    /// Compiles `missing/` in place and archives it as `libs/missing.jar`.
    ///
    /// Returns `Ok(None)` when there is nothing to build.
    pub fn build_missing(&self) -> PackResult<Option<PathBuf>> {
        let missing = self.layout.missing_dir();
        let sources = collect_sources(&missing)?;
        if sources.is_empty() {
            info!(path = %missing.display(), "No missing sources, skipping support archive");
            return Ok(None);
        }
        info!(sources = sources.len(), "Compiling missing sources");
        self.compile(&sources, None)?;

        let libs = self.layout.libs_dir();
        fs::create_dir_all(&libs).map_err(|e| PackError::io(&libs, e))?;
        let jar = self.layout.missing_jar();
        self.archive(&jar, &missing)?;
        info!(path = %jar.display(), "Support archive built");
        Ok(Some(jar))
    }

    /// Compiles the plug-in into `out/`, copies its sources and archives the workspace.
    pub fn build_main(&self, config: &PluginConfig) -> PackResult<ArchiveArtifact> {
        let java = self.layout.java_dir();
        let out = self.layout.out_dir();
        fs::create_dir_all(&out).map_err(|e| PackError::io(&out, e))?;

        let sources = collect_sources(&java)?;
        if sources.is_empty() {
            warn!(path = %java.display(), "No plugin sources found, skipping compilation");
        } else {
            info!(sources = sources.len(), "Compiling plugin sources");
            self.compile(&sources, Some(&out))?;
        }

        if java.exists() {
            let copied = copy_tree(&java, &out.join("src"))?;
            debug!(files = copied, "Copied plugin sources into workspace");
        }

        let artifact = ArchiveArtifact {
            path: self.layout.archive_path(config),
        };
        self.archive(&artifact.path, &out)?;
        info!(path = %artifact.path.display(), "Plugin archive built");
        Ok(artifact)
    }

    /// Runs both phases. A failing missing phase does not stop the main phase.
    pub fn build(&self, config: &PluginConfig) -> PackResult<ArchiveArtifact> {
        if let Err(e) = self.build_missing() {
            error!(error = %e, "Missing-sources build failed, continuing with main build");
        }
        self.build_main(config)
    }
}
