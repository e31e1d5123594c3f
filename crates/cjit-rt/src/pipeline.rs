//! The compile-link-execute pipeline.
//!
//! Steps run strictly in this order, and the first failure aborts the rest:
//!
//! 1. load the source and build the program's `argv`
//! 2. create the workspace and stage the embedded runtime libraries into it
//! 3. create and configure a compiler session pointing at the workspace
//! 4. compile, bind host symbols, relocate
//! 5. resolve `main` and call it
//!
//! The session lives entirely inside [`Launcher::run_in`], so it is always deleted
//! before the workspace is removed.

use crate::stage::{stage, AssetWriter, FsWriter};
use crate::workspace::Workspace;
use crate::{LaunchConfig, RuntimeError};
use cjit_assets::EmbeddedAsset;
use cjit_native::{CompilerSession, HostSymbolTable, ProgramArgs, SharedSink};
use log::Level;
use miette::Diagnostic;
use std::path::Path;
use std::rc::Rc;

/// Exit status used whenever the program could not be invoked.
pub const FAILURE_STATUS: i32 = 1;

/// Drives a single launch.
pub struct Launcher<'a> {
    config: &'a LaunchConfig,
    assets: &'a [EmbeddedAsset<'a>],
    symbols: HostSymbolTable,
    writer: Box<dyn AssetWriter + 'a>,
    sink: SharedSink,
}

impl<'a> Launcher<'a> {
    /// A launcher using the embedded assets and the standard host symbols.
    pub fn new(config: &'a LaunchConfig, sink: SharedSink) -> Self {
        Self {
            config,
            assets: cjit_assets::runtime_assets(),
            symbols: HostSymbolTable::standard(),
            writer: Box::new(FsWriter),
            sink,
        }
    }

    pub fn with_assets(mut self, assets: &'a [EmbeddedAsset<'a>]) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_symbols(mut self, symbols: HostSymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_writer(mut self, writer: impl AssetWriter + 'a) -> Self {
        self.writer = Box::new(writer);
        self
    }

    fn status(&self, message: &str) {
        self.sink.emit(Level::Info, message);
    }

    /// Runs the program and maps every failure to [`FAILURE_STATUS`].
    ///
    /// Errors are reported through the sink, prefixed with their diagnostic code.
    pub fn run(&self) -> i32 {
        self.status(&format!("CJIT {}", env!("CARGO_PKG_VERSION")));
        let status = match self.execute() {
            Ok(status) => status,
            Err(err) => {
                self.report(&err);
                FAILURE_STATUS
            }
        };
        self.status("Execution completed");
        status
    }

    /// Runs the program, returning its exit status.
    pub fn execute(&self) -> Result<i32, RuntimeError> {
        self.status(&format!("Source to execute: {}", self.config.source_path().display()));
        let source = crate::load_source(self.config.source_path())?;
        let mut args = ProgramArgs::new(self.config.argv())?;

        let workspace = Workspace::create(self.config.workspace_root())?;
        self.sink
            .emit(Level::Debug, &format!("Workspace: {}", workspace.path().display()));

        let outcome = self.run_in(workspace.path(), &source, &mut args);

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            self.sink.emit(
                Level::Warn,
                &format!("Failed to remove temp dir {}: {}", path.display(), e),
            );
        }
        outcome
    }

    fn run_in(&self, dir: &Path, source: &[u8], args: &mut ProgramArgs) -> Result<i32, RuntimeError> {
        stage(dir, self.assets, self.writer.as_ref())?;

        let mut session = CompilerSession::new(Rc::clone(&self.sink))?;
        session.configure(&self.config.session_config(dir))?;

        let unit = session.compile(source)?;
        self.status("Compilation successful");

        let image = unit.bind_host_symbols(&self.symbols)?.relocate()?;
        let entry = image.entry(self.config.entry_symbol())?;

        self.status("Execution start");
        let status = entry.invoke(args);
        log::debug!("program returned {}", status);
        Ok(status)
    }

    fn report(&self, err: &RuntimeError) {
        let message = match err.code() {
            Some(code) => format!("[{}] {}", code, err),
            None => err.to_string(),
        };
        self.sink.emit(Level::Error, &message);
        if let Some(help) = err.help() {
            self.sink.emit(Level::Info, &format!("help: {}", help));
        }
    }
}

/// Runs `config` with the embedded assets, returning the process exit status.
pub fn run(config: &LaunchConfig, sink: SharedSink) -> i32 {
    Launcher::new(config, sink).run()
}
