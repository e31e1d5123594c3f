//! Locates an installed `libtcc` and links it into the crate.
//!
//! Search order:
//! 1. `CJIT_TCC_DIR` - either an install prefix (containing `lib/`) or a library directory.
//! 2. The prefix of the `tcc` executable found on `PATH`.
//! 3. `/usr/local` and `/usr`.
//!
//! `CJIT_TCC_LINK` forces the link kind (`static` or `dylib`). Without it a shared
//! library is preferred when both are present.
//!
//! The resolved directories are published to dependent build scripts through the
//! `links = "tcc"` metadata as `DEP_TCC_LIBDIR`, `DEP_TCC_RUNTIME_DIR` and
//! `DEP_TCC_INCLUDE`.

use std::env;
use std::path::{Path, PathBuf};

const LIB_SUBDIRS: &[&str] = &[
    "lib/x86_64-linux-gnu",
    "lib/aarch64-linux-gnu",
    "lib/riscv64-linux-gnu",
    "lib64",
    "lib",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Static,
    Dylib,
}

impl LinkKind {
    fn as_str(self) -> &'static str {
        match self {
            LinkKind::Static => "static",
            LinkKind::Dylib => "dylib",
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CJIT_TCC_DIR");
    println!("cargo:rerun-if-env-changed=CJIT_TCC_LINK");

    let forced_kind = match env::var("CJIT_TCC_LINK").ok().as_deref() {
        Some("static") => Some(LinkKind::Static),
        Some("dylib") | Some("shared") => Some(LinkKind::Dylib),
        Some(other) => {
            println!("cargo:warning=ignoring unknown CJIT_TCC_LINK value '{}'", other);
            None
        }
        None => None,
    };

    let candidates = candidate_lib_dirs();
    let found = candidates
        .iter()
        .find_map(|dir| link_kind_for(dir, forced_kind).map(|kind| (dir.clone(), kind)));

    let kind = match &found {
        Some((dir, kind)) => {
            println!("cargo:rustc-link-search=native={}", dir.display());
            println!("cargo:libdir={}", dir.display());
            publish_runtime_dir(dir);
            *kind
        }
        None => {
            println!(
                "cargo:warning=libtcc not found (searched {} directories); set CJIT_TCC_DIR to its install prefix",
                candidates.len()
            );
            forced_kind.unwrap_or(LinkKind::Dylib)
        }
    };

    println!("cargo:rustc-link-lib={}=tcc", kind.as_str());
    if kind == LinkKind::Static {
        // libtcc.a pulls these in for its own dlopen/dlsym based loader.
        println!("cargo:rustc-link-lib=dylib=dl");
        println!("cargo:rustc-link-lib=dylib=m");
        println!("cargo:rustc-link-lib=dylib=pthread");
    }
}

/// Library directories to probe, most specific first.
fn candidate_lib_dirs() -> Vec<PathBuf> {
    let mut prefixes: Vec<PathBuf> = Vec::new();
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Some(dir) = env::var_os("CJIT_TCC_DIR").map(PathBuf::from) {
        // Accept a library directory directly as well as a prefix.
        dirs.push(dir.clone());
        prefixes.push(dir);
    }

    if let Ok(tcc) = which::which("tcc") {
        if let Some(prefix) = tcc.parent().and_then(Path::parent) {
            prefixes.push(prefix.to_path_buf());
        }
    }

    prefixes.push(PathBuf::from("/usr/local"));
    prefixes.push(PathBuf::from("/usr"));

    for prefix in &prefixes {
        for sub in LIB_SUBDIRS {
            let dir = prefix.join(sub);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    dirs
}

fn link_kind_for(dir: &Path, forced: Option<LinkKind>) -> Option<LinkKind> {
    let has_shared = dir.join("libtcc.so").is_file();
    let has_static = dir.join("libtcc.a").is_file();
    match forced {
        Some(LinkKind::Static) if has_static => Some(LinkKind::Static),
        Some(LinkKind::Dylib) if has_shared => Some(LinkKind::Dylib),
        Some(_) => None,
        None if has_shared => Some(LinkKind::Dylib),
        None if has_static => Some(LinkKind::Static),
        None => None,
    }
}

/// Publishes the directory holding `libtcc1.a` and the compiler's private headers.
fn publish_runtime_dir(lib_dir: &Path) {
    let mut runtime_dirs = vec![lib_dir.join("tcc")];
    if let Some(parent) = lib_dir.parent() {
        runtime_dirs.push(parent.join("lib").join("tcc"));
    }

    match runtime_dirs.into_iter().find(|dir| dir.join("libtcc1.a").is_file()) {
        Some(dir) => {
            println!("cargo:runtime_dir={}", dir.display());
            let include = dir.join("include");
            if include.is_dir() {
                println!("cargo:include={}", include.display());
                println!("cargo:rustc-env=CJIT_TCC_INCLUDE={}", include.display());
            }
        }
        None => println!(
            "cargo:warning=libtcc1.a not found next to {}; compiled programs may fail to relocate",
            lib_dir.display()
        ),
    }
}
