//! The one place raw function pointers into compiled code are handled.

use crate::session::RelocatedImage;
use crate::NativeError;
use std::ffi::{c_char, c_int, c_void, OsStr};
use std::marker::PhantomData;
use std::os::unix::ffi::OsStrExt;
use std::ptr::{self, NonNull};

/// C signature of `main`.
type MainFn = unsafe extern "C" fn(c_int, *mut *mut c_char) -> c_int;

/// A resolved `int main(int, char **)` inside a relocated image.
///
/// Borrows the image, so it cannot be called after the compiler state is deleted.
pub struct EntryPoint<'image> {
    name: String,
    func: MainFn,
    _image: PhantomData<&'image RelocatedImage>,
}

impl<'image> EntryPoint<'image> {
    /// # Safety
    ///
    /// `address` must be the address of a function with the C signature of `main`,
    /// living in memory owned by the image this entry point borrows.
    pub(crate) unsafe fn from_raw(name: &str, address: NonNull<c_void>) -> Self {
        Self {
            name: name.to_owned(),
            func: std::mem::transmute::<*mut c_void, MainFn>(address.as_ptr()),
            _image: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the entry point and returns whatever it returns.
    ///
    /// Control passes to the compiled program for as long as it runs. Its I/O, its
    /// allocations and any non-local exit are outside the launcher's control; the
    /// program is trusted in the same way a native executable would be.
    pub fn invoke(&self, args: &mut ProgramArgs) -> i32 {
        let argc = args.argc();
        let mut argv = args.argv();
        log::debug!("invoking '{}' with {} argument(s)", self.name, argc);
        // SAFETY: `func` was resolved from the relocated image this value borrows,
        // and `argv` is a NUL-terminated vector of NUL-terminated strings that
        // outlives the call.
        unsafe { (self.func)(argc, argv.as_mut_ptr()) }
    }
}

impl std::fmt::Debug for EntryPoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("func", &(self.func as *const c_void))
            .finish()
    }
}

/// Argument vector handed to the compiled `main`.
///
/// Strings are owned, writable and NUL-terminated, as C programs may modify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramArgs {
    storage: Vec<Box<[u8]>>,
    argc: c_int,
}

/// `argc` for `len` strings, which must fit a C `int`.
fn checked_argc(len: usize) -> Result<c_int, NativeError> {
    c_int::try_from(len).map_err(|_| NativeError::TooManyArguments { count: len })
}

impl ProgramArgs {
    pub fn new<I, S>(args: I) -> Result<Self, NativeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let storage = args
            .into_iter()
            .map(|arg| {
                let bytes = arg.as_ref().as_bytes();
                if bytes.contains(&0) {
                    return Err(NativeError::InvalidArgument {
                        what: "program argument",
                        value: arg.as_ref().to_string_lossy().escape_default().to_string(),
                    });
                }
                let mut owned = Vec::with_capacity(bytes.len() + 1);
                owned.extend_from_slice(bytes);
                owned.push(0);
                Ok(owned.into_boxed_slice())
            })
            .collect::<Result<Vec<_>, _>>()?;
        let argc = checked_argc(storage.len())?;
        Ok(Self { storage, argc })
    }

    pub fn argc(&self) -> c_int {
        self.argc
    }

    /// Pointers into the owned strings followed by the terminating null pointer.
    fn argv(&mut self) -> Vec<*mut c_char> {
        self.storage
            .iter_mut()
            .map(|arg| arg.as_mut_ptr().cast::<c_char>())
            .chain(std::iter::once(ptr::null_mut()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
