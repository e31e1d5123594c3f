//! Runtime support libraries compiled into the binary.
//!
//! The in-memory linker looks for its support archive (and, on static builds, the C
//! library loader shim) as files on disk. The bytes are embedded here at build time
//! and written out to a workspace by the stager before compilation.

/// File name of the compiler runtime support archive.
pub const RUNTIME_ARCHIVE: &str = "libtcc1.a";

/// File name of the dynamic loader shim.
pub const LOADER_SHIM: &str = "libc.so";

/// A named blob of bytes destined for a fixed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedAsset<'a> {
    name: &'a str,
    bytes: &'a [u8],
}

impl<'a> EmbeddedAsset<'a> {
    pub const fn new(name: &'a str, bytes: &'a [u8]) -> Self {
        Self { name, bytes }
    }

    /// File name the asset is staged under.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

include!(concat!(env!("OUT_DIR"), "/assets.rs"));

/// All assets embedded in this build.
pub fn runtime_assets() -> &'static [EmbeddedAsset<'static>] {
    RUNTIME_ASSETS
}

/// Looks up an embedded asset by file name.
pub fn find(name: &str) -> Option<&'static EmbeddedAsset<'static>> {
    RUNTIME_ASSETS.iter().find(|asset| asset.name == name)
}
