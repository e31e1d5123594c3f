use cjit_assets::LOADER_SHIM;
use cjit_native::{OutputMode, SessionConfig, ENTRY_SYMBOL};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Headers matching the musl loader shim, used when that shim is embedded.
const MUSL_INCLUDE_DIR: &str = "/usr/include/x86_64-linux-musl";

/// Everything one launch needs to know, fixed before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    source_path: PathBuf,
    program_args: Vec<OsString>,
    include_paths: Vec<PathBuf>,
    library_paths: Vec<PathBuf>,
    workspace_root: PathBuf,
    entry_symbol: String,
}

impl LaunchConfig {
    /// Configuration for running `source_path` with default search paths.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            program_args: Vec::new(),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            workspace_root: std::env::temp_dir(),
            entry_symbol: ENTRY_SYMBOL.to_owned(),
        }
    }

    /// Arguments passed to the program after its own path.
    pub fn with_program_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_paths.push(path.into());
        self
    }

    /// Directory the per-run workspace is created in.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn program_args(&self) -> &[OsString] {
        &self.program_args
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn library_paths(&self) -> &[PathBuf] {
        &self.library_paths
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn entry_symbol(&self) -> &str {
        &self.entry_symbol
    }

    /// The program's `argv`: the source path followed by the program arguments.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.source_path.clone().into_os_string())
            .chain(self.program_args.iter().cloned())
            .collect()
    }

    /// Compiler search paths for a run staged into `workspace`.
    ///
    /// The workspace comes first for libraries, user paths follow in the order given.
    pub fn session_config(&self, workspace: &Path) -> SessionConfig {
        let mut include_paths = Vec::new();
        if cjit_assets::find(LOADER_SHIM).is_some() && Path::new(MUSL_INCLUDE_DIR).is_dir() {
            include_paths.push(PathBuf::from(MUSL_INCLUDE_DIR));
        }
        include_paths.extend(self.include_paths.iter().cloned());

        SessionConfig {
            runtime_dir: Some(workspace.to_path_buf()),
            include_paths,
            sysinclude_paths: cjit_native::bundled_include_dir()
                .map(Path::to_path_buf)
                .into_iter()
                .collect(),
            library_paths: self.library_paths.clone(),
            output: OutputMode::Memory,
        }
    }
}
