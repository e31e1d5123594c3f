//! Everything around the compiler session needed to run a C file in-process.
//!
//! - [`Workspace`]: the ephemeral directory for this run
//! - [`stage`]: copies the embedded runtime libraries into it
//! - [`Launcher`]: runs the whole pipeline and guarantees cleanup on every path

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod stage;
pub mod workspace;

pub use config::LaunchConfig;
pub use error::{RuntimeError, StagingFailure};
pub use pipeline::{run, Launcher, FAILURE_STATUS};
pub use source::load_source;
pub use stage::{stage, AssetWriter, FsWriter};
pub use workspace::{Workspace, WORKSPACE_PREFIX};
