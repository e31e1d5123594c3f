//! Ownership of one compiler instance, from configuration to a relocated image.
//!
//! The stages are separate types so they can only be walked in order:
//!
//! ```text
//! CompilerSession --compile--> CompiledUnit --bind_host_symbols--> BoundUnit
//!     --relocate--> RelocatedImage --entry--> EntryPoint
//! ```
//!
//! Every stage owns the same underlying compiler state. Dropping any of them, on
//! success or at an early return, deletes that state exactly once.

use crate::diagnostic::{classify, SharedSink};
use crate::entry::EntryPoint;
use crate::symbols::HostSymbolTable;
use crate::NativeError;
use cjit_tcc as tcc;
use parking_lot::{Mutex, MutexGuard};
use std::ffi::{c_char, c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// The compiler keeps global state, so only one instance may exist at a time.
static TOOLCHAIN_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Where compilation output goes. Only in-memory images are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Memory,
}

/// Search paths and output selection applied by [`CompilerSession::configure`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory holding the runtime support archive (the staged workspace).
    pub runtime_dir: Option<PathBuf>,
    pub include_paths: Vec<PathBuf>,
    pub sysinclude_paths: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub output: OutputMode,
}

/// Owner of the raw compiler state.
struct TccState {
    raw: NonNull<tcc::TCCState>,
    // Boxed so the address registered with the error callback never moves.
    _sink: Box<SharedSink>,
    _lock: MutexGuard<'static, ()>,
}

impl TccState {
    fn new(sink: SharedSink) -> Result<Self, NativeError> {
        let lock = TOOLCHAIN_LOCK.lock();
        // SAFETY: plain constructor, checked for null below.
        let raw = NonNull::new(unsafe { tcc::tcc_new() }).ok_or(NativeError::ToolchainInit)?;
        let sink = Box::new(sink);
        let opaque = &*sink as *const SharedSink as *mut c_void;
        // SAFETY: `opaque` points into `sink`, which lives exactly as long as `raw`.
        unsafe { tcc::tcc_set_error_func(raw.as_ptr(), opaque, Some(forward_diagnostic)) };
        Ok(Self { raw, _sink: sink, _lock: lock })
    }

    fn as_ptr(&self) -> *mut tcc::TCCState {
        self.raw.as_ptr()
    }
}

impl Drop for TccState {
    fn drop(&mut self) {
        log::debug!("deleting compiler state");
        // SAFETY: `raw` came from `tcc_new` and is deleted only here.
        unsafe { tcc::tcc_delete(self.raw.as_ptr()) };
    }
}

/// Receives every message the compiler reports, split into lines.
unsafe extern "C" fn forward_diagnostic(opaque: *mut c_void, msg: *const c_char) {
    if opaque.is_null() || msg.is_null() {
        return;
    }
    // SAFETY: `opaque` is the boxed sink registered in `TccState::new`.
    let sink = &*(opaque as *const SharedSink);
    let message = CStr::from_ptr(msg).to_string_lossy();
    for line in message.lines().filter(|line| !line.trim().is_empty()) {
        sink.emit(classify(line), line);
    }
}

fn c_path(what: &'static str, path: &Path) -> Result<CString, NativeError> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| NativeError::InvalidArgument {
        what,
        value: path.display().to_string(),
    })
}

/// A configured compiler instance that has not compiled anything yet.
pub struct CompilerSession {
    state: TccState,
    runtime_dir: Option<PathBuf>,
    include_paths: Vec<PathBuf>,
    sysinclude_paths: Vec<PathBuf>,
    library_paths: Vec<PathBuf>,
    output: Option<OutputMode>,
}

impl CompilerSession {
    /// Creates a compiler instance reporting to `sink`.
    ///
    /// Blocks while another session is alive anywhere in the process.
    pub fn new(sink: SharedSink) -> Result<Self, NativeError> {
        let state = TccState::new(sink)?;
        log::debug!("compiler state created");
        Ok(Self {
            state,
            runtime_dir: None,
            include_paths: Vec::new(),
            sysinclude_paths: Vec::new(),
            library_paths: Vec::new(),
            output: None,
        })
    }

    /// Applies search paths and the output mode.
    ///
    /// Paths already known to the session are skipped, so applying the same
    /// configuration twice leaves the session unchanged.
    pub fn configure(&mut self, config: &SessionConfig) -> Result<(), NativeError> {
        if let Some(dir) = &config.runtime_dir {
            if self.runtime_dir.as_ref() != Some(dir) {
                let c_dir = c_path("runtime directory", dir)?;
                // SAFETY: valid state and NUL-terminated path.
                unsafe { tcc::tcc_set_lib_path(self.state.as_ptr(), c_dir.as_ptr()) };
                self.runtime_dir = Some(dir.clone());
            }
            // The runtime directory also serves as the first library search path.
            self.add_library_path(dir)?;
        }

        for path in &config.include_paths {
            if !self.include_paths.contains(path) {
                let c_dir = c_path("include path", path)?;
                // SAFETY: as above.
                unsafe { tcc::tcc_add_include_path(self.state.as_ptr(), c_dir.as_ptr()) };
                log::debug!("include path: {}", path.display());
                self.include_paths.push(path.clone());
            }
        }

        for path in &config.sysinclude_paths {
            if !self.sysinclude_paths.contains(path) {
                let c_dir = c_path("system include path", path)?;
                // SAFETY: as above.
                unsafe { tcc::tcc_add_sysinclude_path(self.state.as_ptr(), c_dir.as_ptr()) };
                log::debug!("system include path: {}", path.display());
                self.sysinclude_paths.push(path.clone());
            }
        }

        for path in &config.library_paths {
            self.add_library_path(path)?;
        }

        self.set_output(config.output);
        Ok(())
    }

    fn add_library_path(&mut self, path: &Path) -> Result<(), NativeError> {
        if self.library_paths.iter().any(|known| known == path) {
            return Ok(());
        }
        let c_dir = c_path("library path", path)?;
        // SAFETY: valid state and NUL-terminated path.
        unsafe { tcc::tcc_add_library_path(self.state.as_ptr(), c_dir.as_ptr()) };
        log::debug!("library path: {}", path.display());
        self.library_paths.push(path.to_path_buf());
        Ok(())
    }

    fn set_output(&mut self, mode: OutputMode) {
        if self.output == Some(mode) {
            return;
        }
        let output_type = match mode {
            OutputMode::Memory => tcc::TCC_OUTPUT_MEMORY,
        };
        // SAFETY: valid state; the output type is a known constant.
        unsafe { tcc::tcc_set_output_type(self.state.as_ptr(), output_type) };
        self.output = Some(mode);
    }

    pub fn runtime_dir(&self) -> Option<&Path> {
        self.runtime_dir.as_deref()
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn sysinclude_paths(&self) -> &[PathBuf] {
        &self.sysinclude_paths
    }

    pub fn library_paths(&self) -> &[PathBuf] {
        &self.library_paths
    }

    pub fn output(&self) -> Option<OutputMode> {
        self.output
    }

    /// Compiles `source` as a single translation unit into memory.
    ///
    /// Diagnostics reach the sink while this runs. On failure the compiler state is
    /// deleted before the error is returned.
    pub fn compile(mut self, source: impl AsRef<[u8]>) -> Result<CompiledUnit, NativeError> {
        if self.output.is_none() {
            self.set_output(OutputMode::Memory);
        }
        let source = source.as_ref();
        let text = CString::new(source).map_err(|e| NativeError::InteriorNul { offset: e.nul_position() })?;
        // SAFETY: valid state and NUL-terminated source text.
        let status = unsafe { tcc::tcc_compile_string(self.state.as_ptr(), text.as_ptr()) };
        if status == -1 {
            return Err(NativeError::Compile);
        }
        log::debug!("compiled {} bytes of source", source.len());
        Ok(CompiledUnit { state: self.state })
    }
}

/// A compiled, not yet linked program image.
pub struct CompiledUnit {
    state: TccState,
}

impl CompiledUnit {
    /// Makes the host symbols in `table` resolvable from the compiled code.
    pub fn bind_host_symbols(self, table: &HostSymbolTable) -> Result<BoundUnit, NativeError> {
        for symbol in table.iter() {
            // SAFETY: valid state; the name is NUL-terminated and the address is a
            // host symbol that outlives the process' use of the image.
            let status = unsafe {
                tcc::tcc_add_symbol(self.state.as_ptr(), symbol.c_name().as_ptr(), symbol.address())
            };
            if status < 0 {
                return Err(NativeError::SymbolRegistration(symbol.name().to_owned()));
            }
        }
        log::debug!("registered {} host symbol(s)", table.len());
        Ok(BoundUnit { state: self.state })
    }
}

/// A compiled image with host symbols registered, ready for relocation.
pub struct BoundUnit {
    state: TccState,
}

impl BoundUnit {
    /// Resolves every address in the image and makes it executable.
    pub fn relocate(self) -> Result<RelocatedImage, NativeError> {
        // SAFETY: valid state; the compiler allocates and owns the code memory.
        let status = unsafe { tcc::tcc_relocate(self.state.as_ptr(), tcc::TCC_RELOCATE_AUTO) };
        if status < 0 {
            return Err(NativeError::Relocation);
        }
        log::debug!("image relocated");
        Ok(RelocatedImage { state: self.state })
    }
}

/// An executable image living in memory owned by the compiler state.
pub struct RelocatedImage {
    state: TccState,
}

impl RelocatedImage {
    /// Looks up the entry function `name`.
    pub fn entry(&self, name: &str) -> Result<EntryPoint<'_>, NativeError> {
        let address = self
            .symbol(name)?
            .ok_or_else(|| NativeError::EntryMissing(name.to_owned()))?;
        // SAFETY: the address belongs to this image and the entry point borrows it.
        // The symbol is trusted to have the signature of `main`.
        Ok(unsafe { EntryPoint::from_raw(name, address) })
    }

    /// Raw address of a symbol defined by the image, if any.
    pub fn symbol(&self, name: &str) -> Result<Option<NonNull<c_void>>, NativeError> {
        let c_name = CString::new(name).map_err(|_| NativeError::InvalidArgument {
            what: "symbol name",
            value: name.escape_default().to_string(),
        })?;
        // SAFETY: valid, relocated state and NUL-terminated name.
        let address = unsafe { tcc::tcc_get_symbol(self.state.as_ptr(), c_name.as_ptr()) };
        Ok(NonNull::new(address))
    }
}

impl std::fmt::Debug for CompilerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerSession")
            .field("runtime_dir", &self.runtime_dir)
            .field("include_paths", &self.include_paths)
            .field("sysinclude_paths", &self.sysinclude_paths)
            .field("library_paths", &self.library_paths)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CompiledUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledUnit").finish_non_exhaustive()
    }
}
