use cjit_native::NativeError;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or running a program.
#[derive(Error, Debug, Diagnostic)]
pub enum RuntimeError {
    #[error("Error creating temp dir in {}: {source}", .root.display())]
    #[diagnostic(
        code(cjit::workspace),
        help("check that the directory exists and is writable, or choose another with --tmpdir")
    )]
    Workspace {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File not found: {}", .path.display())]
    #[diagnostic(code(cjit::source_not_found))]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage {name} into {}: {source}", .dir.display())]
    #[diagnostic(code(cjit::staging))]
    Staging {
        name: String,
        dir: PathBuf,
        #[source]
        source: StagingFailure,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),
}

/// Why a single asset could not be written.
#[derive(Error, Debug)]
pub enum StagingFailure {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { expected: u64, written: u64 },

    #[error("'{0}' is not a plain file name")]
    InvalidName(String),
}
