//! Raw FFI declarations for `libtcc`.
//!
//! Only the subset of the API the launcher needs is declared. Everything here is
//! `unsafe`; the safe, owning wrapper lives in `cjit-native`.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_void};

/// Opaque compiler state.
#[repr(C)]
pub struct TCCState {
    _private: [u8; 0],
}

/// Error/warning callback installed with [`tcc_set_error_func`].
pub type TCCErrorFunc = Option<unsafe extern "C" fn(opaque: *mut c_void, msg: *const c_char)>;

/// Output into memory, for `tcc_relocate` followed by `tcc_get_symbol`.
pub const TCC_OUTPUT_MEMORY: c_int = 1;

/// Let `tcc_relocate` allocate and own the executable memory.
///
/// Releases that take a single argument ignore the second one under the C calling
/// convention, so passing it unconditionally works with both API revisions.
pub const TCC_RELOCATE_AUTO: *mut c_void = 1usize as *mut c_void;

/// The compiler's private header directory (`stddef.h`, `stdarg.h`, ...) found at
/// build time. The launcher points the library path at its workspace, so these
/// headers have to be added back as a system include path.
pub const BUNDLED_INCLUDE_DIR: Option<&str> = option_env!("CJIT_TCC_INCLUDE");

extern "C" {
    pub fn tcc_new() -> *mut TCCState;
    pub fn tcc_delete(s: *mut TCCState);

    /// Sets the directory searched for `libtcc1.a` and the private `include/`.
    pub fn tcc_set_lib_path(s: *mut TCCState, path: *const c_char);
    pub fn tcc_set_error_func(s: *mut TCCState, error_opaque: *mut c_void, error_func: TCCErrorFunc);

    pub fn tcc_add_include_path(s: *mut TCCState, pathname: *const c_char) -> c_int;
    pub fn tcc_add_sysinclude_path(s: *mut TCCState, pathname: *const c_char) -> c_int;

    /// Returns -1 on error.
    pub fn tcc_compile_string(s: *mut TCCState, buf: *const c_char) -> c_int;

    pub fn tcc_set_output_type(s: *mut TCCState, output_type: c_int) -> c_int;
    pub fn tcc_add_library_path(s: *mut TCCState, pathname: *const c_char) -> c_int;
    pub fn tcc_add_symbol(s: *mut TCCState, name: *const c_char, val: *const c_void) -> c_int;

    /// Returns a negative value on error.
    pub fn tcc_relocate(s: *mut TCCState, ptr: *mut c_void) -> c_int;
    pub fn tcc_get_symbol(s: *mut TCCState, name: *const c_char) -> *mut c_void;
}
