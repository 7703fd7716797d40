//! Command-line interface: argument parsing and the `run` entrypoint shared
//! by `main()` and the integration tests.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::dispatch::{dispatch, plan, ErrorPolicy, Pipeline};
use crate::load_config::load_config;
use crate::workspace::ProjectLayout;

/// Render, compile, package and deploy an Appian plug-in.
#[derive(Parser, Debug)]
#[clap(
    name = "appian-pack",
    version,
    about = "Render, compile, package and deploy an Appian plug-in from config.json"
)]
pub struct Cli {
    /// Verbs to run in order: reset, config, build, doc, deploy, all
    pub verbs: Vec<String>,

    /// Project directory holding config.json, templates/, java/, missing/ and libs/
    #[clap(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Configuration file (JSON, or YAML by extension); defaults to <project-dir>/config.json
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Keep running later verbs after a stage fails
    #[clap(long)]
    pub keep_going: bool,
}

impl Cli {
    pub fn policy(&self) -> ErrorPolicy {
        if self.keep_going {
            ErrorPolicy::Lenient
        } else {
            ErrorPolicy::FailFast
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");
    tracing::info!(verbs = ?cli.verbs, "Arguments received");

    if plan(&cli.verbs).is_empty() {
        tracing::warn!("No known verb given, nothing to do");
        return Ok(());
    }

    let layout = ProjectLayout::new(&cli.project_dir);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| layout.default_config_file());
    let config = load_config(&config_path)?;

    let pipeline = Pipeline::new(config, layout);
    let report = dispatch(&pipeline, &cli.verbs, cli.policy()).await;

    if report.is_success() {
        tracing::info!(stages = report.completed.len(), "All stages complete");
        return Ok(());
    }
    for failure in &report.failures {
        eprintln!("[ERROR] {} failed: {}", failure.stage, failure.error);
    }
    anyhow::bail!(
        "{} stage(s) failed, {} completed",
        report.failures.len(),
        report.completed.len()
    )
}
