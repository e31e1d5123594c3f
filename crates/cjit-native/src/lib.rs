//! In-memory compilation and execution of C programs.
//!
//! This crate wraps the raw `libtcc` bindings in owning types:
//! - [`CompilerSession`] configures one compiler instance and compiles a source text
//! - [`HostSymbolTable`] lists the host functions and variables the program may use
//! - [`RelocatedImage`] and [`EntryPoint`] run the result inside the current process
//!
//! Diagnostics reported by the compiler are forwarded line by line to a
//! [`DiagnosticSink`] supplied when the session is created.

pub mod diagnostic;
pub mod entry;
pub mod error;
pub mod session;
pub mod symbols;

pub use diagnostic::{CollectingSink, DiagnosticSink, LogSink, SharedSink};
pub use entry::{EntryPoint, ProgramArgs};
pub use error::NativeError;
pub use session::{BoundUnit, CompiledUnit, CompilerSession, OutputMode, RelocatedImage, SessionConfig};
pub use symbols::{HostSymbol, HostSymbolTable};

/// Name of the function every program must define.
pub const ENTRY_SYMBOL: &str = "main";

/// The compiler's private header directory discovered at build time, if any.
pub fn bundled_include_dir() -> Option<&'static std::path::Path> {
    cjit_tcc::BUNDLED_INCLUDE_DIR.map(std::path::Path::new)
}
