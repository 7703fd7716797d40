//! Maps command-line verbs to packaging stages.
//!
//! Verbs run in the order given. `all` expands to reset, config, build, doc,
//! deploy and ends argument processing. Unknown verbs are logged and skipped.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use mockall::automock;
use tracing::{error, info, warn};

use crate::config::PluginConfig;
use crate::error::{PackError, PackResult};
use crate::generate::{generate_documentation, generate_resources};
use crate::package::{ArchiveArtifact, Packager};
use crate::render::TemplateRenderer;
use crate::upload::{HttpUploader, Uploader};
use crate::workspace::{reset_workspace, ProjectLayout};

/// A command-line verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Stage(Stage),
    /// Every stage in [`Stage::SEQUENCE`] order.
    All,
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(Verb::Stage(Stage::Reset)),
            "config" => Ok(Verb::Stage(Stage::Config)),
            "build" => Ok(Verb::Stage(Stage::Build)),
            "deploy" => Ok(Verb::Stage(Stage::Deploy)),
            "doc" => Ok(Verb::Stage(Stage::Doc)),
            "all" => Ok(Verb::All),
            other => Err(other.to_string()),
        }
    }
}

/// One packaging step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Reset,
    Config,
    Build,
    Deploy,
    Doc,
}

impl Stage {
    /// Stages run by `all`, in order.
    pub const SEQUENCE: [Stage; 5] = [
        Stage::Reset,
        Stage::Config,
        Stage::Build,
        Stage::Doc,
        Stage::Deploy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Reset => "reset",
            Stage::Config => "config",
            Stage::Build => "build",
            Stage::Deploy => "deploy",
            Stage::Doc => "doc",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the dispatcher does when a stage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first failing stage.
    #[default]
    FailFast,
    /// Log the failure and run the remaining stages.
    Lenient,
}

/// Resolves raw arguments into the stages to run.
pub fn plan<A: AsRef<str>>(args: &[A]) -> Vec<Stage> {
    let mut stages = Vec::new();
    for arg in args {
        match arg.as_ref().parse::<Verb>() {
            Ok(Verb::All) => {
                stages.extend(Stage::SEQUENCE);
                break;
            }
            Ok(Verb::Stage(stage)) => stages.push(stage),
            Err(unknown) => warn!(verb = %unknown, "Ignoring unknown verb"),
        }
    }
    stages
}

/// The packaging stages a verb can trigger.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Stages: Send + Sync {
    async fn reset(&self) -> PackResult<()>;
    async fn config(&self) -> PackResult<()>;
    async fn build(&self) -> PackResult<()>;
    async fn doc(&self) -> PackResult<()>;
    async fn deploy(&self) -> PackResult<()>;
}

#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: PackError,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub completed: Vec<Stage>,
    pub failures: Vec<StageFailure>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

async fn run_stage<S: Stages + ?Sized>(stages: &S, stage: Stage) -> PackResult<()> {
    match stage {
        Stage::Reset => stages.reset().await,
        Stage::Config => stages.config().await,
        Stage::Build => stages.build().await,
        Stage::Doc => stages.doc().await,
        Stage::Deploy => stages.deploy().await,
    }
}

/// Runs the verbs in `args` against `stages` under `policy`.
pub async fn dispatch<S, A>(stages: &S, args: &[A], policy: ErrorPolicy) -> DispatchReport
where
    S: Stages + ?Sized,
    A: AsRef<str>,
{
    let mut report = DispatchReport::default();
    for stage in plan(args) {
        info!(stage = %stage, "Running stage");
        match run_stage(stages, stage).await {
            Ok(()) => {
                info!(stage = %stage, "Stage complete");
                report.completed.push(stage);
            }
            Err(e) => {
                error!(stage = %stage, error = %e, "Stage failed");
                report.failures.push(StageFailure { stage, error: e });
                if policy == ErrorPolicy::FailFast {
                    warn!("Aborting remaining stages");
                    break;
                }
            }
        }
    }
    report
}

/// The real stages, sharing one loaded configuration.
pub struct Pipeline {
    config: PluginConfig,
    layout: ProjectLayout,
    renderer: TemplateRenderer,
    uploader: Box<dyn Uploader>,
}

impl Pipeline {
    pub fn new(config: PluginConfig, layout: ProjectLayout) -> Self {
        let renderer = TemplateRenderer::new(layout.templates_dir());
        let uploader: Box<dyn Uploader> = Box::new(HttpUploader::new(&config.deploy));
        Self {
            config,
            layout,
            renderer,
            uploader,
        }
    }

    /// Replaces the HTTP uploader.
    pub fn with_uploader(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn plugin_config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn artifact(&self) -> ArchiveArtifact {
        ArchiveArtifact {
            path: self.layout.archive_path(&self.config),
        }
    }
}

#[async_trait]
impl Stages for Pipeline {
    async fn reset(&self) -> PackResult<()> {
        reset_workspace(&self.layout)
    }

    async fn config(&self) -> PackResult<()> {
        generate_resources(&self.config, &self.layout, &self.renderer).map(|_| ())
    }

    async fn build(&self) -> PackResult<()> {
        Packager::new(&self.layout, &self.config.build)
            .build(&self.config)
            .map(|_| ())
    }

    async fn doc(&self) -> PackResult<()> {
        generate_documentation(&self.config, &self.layout, &self.renderer).map(|_| ())
    }

    async fn deploy(&self) -> PackResult<()> {
        let report = self.uploader.upload(&self.artifact()).await?;
        println!("Response Status: {}", report.status);
        Ok(())
    }
}
