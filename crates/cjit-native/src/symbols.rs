//! Host process symbols exposed to compiled code.

use crate::NativeError;
use std::ffi::{c_void, CString};
use std::ptr;

extern "C" {
    static stdin: *mut libc::FILE;
    static stdout: *mut libc::FILE;
    static stderr: *mut libc::FILE;
}

/// One exported name and the host address it resolves to.
#[derive(Debug, Clone)]
pub struct HostSymbol {
    name: String,
    c_name: CString,
    address: *const c_void,
}

impl HostSymbol {
    pub fn new(name: &str, address: *const c_void) -> Result<Self, NativeError> {
        let c_name = CString::new(name).map_err(|_| NativeError::InvalidArgument {
            what: "symbol name",
            value: name.escape_default().to_string(),
        })?;
        Ok(Self {
            name: name.to_owned(),
            c_name,
            address,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn c_name(&self) -> &CString {
        &self.c_name
    }

    pub fn address(&self) -> *const c_void {
        self.address
    }
}

/// The fixed set of symbols registered into every session before relocation.
///
/// Data symbols (`stdout`, ...) resolve to the address of the host's variable, so a
/// compiled `extern FILE *stdout;` reads the same stream pointer the host uses.
#[derive(Debug, Clone)]
pub struct HostSymbolTable {
    symbols: Vec<HostSymbol>,
}

impl HostSymbolTable {
    /// Standard streams and the formatted output functions.
    pub fn standard() -> Self {
        // SAFETY: only the addresses of the C library's stream variables are taken.
        let streams: [(&str, *const c_void); 3] = unsafe {
            [
                ("stdin", ptr::addr_of!(stdin).cast()),
                ("stdout", ptr::addr_of!(stdout).cast()),
                ("stderr", ptr::addr_of!(stderr).cast()),
            ]
        };
        let functions: [(&str, *const c_void); 5] = [
            ("fprintf", libc::fprintf as *const c_void),
            ("printf", libc::printf as *const c_void),
            ("fputs", libc::fputs as *const c_void),
            ("puts", libc::puts as *const c_void),
            ("fflush", libc::fflush as *const c_void),
        ];

        let symbols = streams
            .into_iter()
            .chain(functions)
            .filter_map(|(name, address)| HostSymbol::new(name, address).ok())
            .collect();
        Self { symbols }
    }

    /// An empty table; nothing but what the toolchain finds on its own is linkable.
    pub fn empty() -> Self {
        Self { symbols: Vec::new() }
    }

    /// Adds or replaces an entry.
    pub fn with_symbol(mut self, symbol: HostSymbol) -> Self {
        self.symbols.retain(|existing| existing.name != symbol.name);
        self.symbols.push(symbol);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostSymbol> {
        self.symbols.iter().find(|symbol| symbol.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostSymbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for HostSymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_exports_streams_and_fprintf() {
        let table = HostSymbolTable::standard();
        for name in ["stdout", "stderr", "fprintf"] {
            let symbol = table.get(name).unwrap_or_else(|| panic!("{} missing", name));
            assert!(!symbol.address().is_null());
        }
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn stream_symbols_point_at_the_host_variables() {
        let table = HostSymbolTable::standard();
        let address = table.get("stdout").unwrap().address() as *const *mut libc::FILE;
        let host = unsafe { stdout };
        assert_eq!(unsafe { *address }, host);
    }

    #[test]
    fn with_symbol_replaces_existing_entry() {
        let marker = 0x1000 as *const c_void;
        let table = HostSymbolTable::standard().with_symbol(HostSymbol::new("puts", marker).unwrap());
        assert_eq!(table.len(), 8);
        assert_eq!(table.get("puts").unwrap().address(), marker);
    }

    #[test]
    fn names_with_nul_are_rejected() {
        let err = HostSymbol::new("bad\0name", ptr::null()).unwrap_err();
        assert!(matches!(err, NativeError::InvalidArgument { what: "symbol name", .. }));
    }

    #[test]
    fn name_and_c_name_agree() {
        let symbol = HostSymbol::new("cjit_host_hook", ptr::null()).unwrap();
        assert_eq!(symbol.name(), "cjit_host_hook");
        assert_eq!(symbol.c_name().to_bytes(), b"cjit_host_hook");

        for symbol in HostSymbolTable::standard().iter() {
            assert_eq!(symbol.c_name().to_str().unwrap(), symbol.name());
        }
    }

    #[test]
    fn empty_table_has_no_entries() {
        assert!(HostSymbolTable::empty().is_empty());
        assert!(!HostSymbolTable::empty().contains("stdout"));
    }
}
