//! appian-pack: render, compile, package and deploy an Appian plug-in.
//!
//! Stages communicate only through the filesystem and one immutable
//! [`PluginConfig`]: `reset` clears `out/`, `config` renders the descriptor and
//! localized properties, `build` runs `javac`/`jar`, `doc` renders the
//! documentation page and `deploy` uploads the archive.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generate;
pub mod load_config;
pub mod package;
pub mod render;
pub mod upload;
pub mod workspace;

pub use cli::{run, Cli};
pub use config::PluginConfig;
pub use error::{PackError, PackResult};
