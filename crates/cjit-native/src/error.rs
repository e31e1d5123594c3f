use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while compiling, linking or entering a program.
#[derive(Error, Debug, Diagnostic)]
pub enum NativeError {
    #[error("Could not initialize tcc")]
    #[diagnostic(
        code(cjit::toolchain_init),
        help("the compiler could not allocate its state; the process may be out of memory")
    )]
    ToolchainInit,

    #[error("Compilation failed")]
    #[diagnostic(code(cjit::compile), help("see the compiler diagnostics above"))]
    Compile,

    #[error("Source text contains a NUL byte at offset {offset}")]
    #[diagnostic(code(cjit::compile))]
    InteriorNul { offset: usize },

    #[error("{what} contains a NUL byte: {value}")]
    #[diagnostic(code(cjit::invalid_argument))]
    InvalidArgument { what: &'static str, value: String },

    #[error("Too many program arguments: {count}")]
    #[diagnostic(code(cjit::invalid_argument))]
    TooManyArguments { count: usize },

    #[error("Failed to register host symbol '{0}'")]
    #[diagnostic(code(cjit::symbol))]
    SymbolRegistration(String),

    #[error("TCC relocation error")]
    #[diagnostic(
        code(cjit::relocation),
        help("the program references symbols that are neither defined, exported by the host nor provided by the runtime libraries")
    )]
    Relocation,

    #[error("Symbol not found in source: {0}")]
    #[diagnostic(code(cjit::entry_missing), help("define `int main(int argc, char **argv)`"))]
    EntryMissing(String),
}
