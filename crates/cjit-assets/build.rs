//! Generates the embedded asset table (`$OUT_DIR/assets.rs`).
//!
//! * `libtcc1.a` comes from `CJIT_LIBTCC1`, or from the runtime directory the
//!   `cjit-tcc` build script discovered (`DEP_TCC_RUNTIME_DIR`).
//! * `libc.so` is only embedded when `CJIT_LIBC_SO` names a loader shim explicitly.
//!   It is meant for fully static builds against musl; a dynamically linked host
//!   already provides its C library to the in-memory linker.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

struct AssetSource {
    name: &'static str,
    path: Option<PathBuf>,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CJIT_LIBTCC1");
    println!("cargo:rerun-if-env-changed=CJIT_LIBC_SO");

    let runtime_archive = env::var_os("CJIT_LIBTCC1").map(PathBuf::from).or_else(|| {
        env::var_os("DEP_TCC_RUNTIME_DIR").map(|dir| PathBuf::from(dir).join("libtcc1.a"))
    });
    let loader_shim = env::var_os("CJIT_LIBC_SO").map(PathBuf::from);

    let sources = [
        AssetSource { name: "libtcc1.a", path: runtime_archive },
        AssetSource { name: "libc.so", path: loader_shim },
    ];

    let mut table = String::new();
    table.push_str("/// Assets embedded at build time, in staging order.\n");
    table.push_str("pub static RUNTIME_ASSETS: &[EmbeddedAsset<'static>] = &[\n");
    for source in &sources {
        let Some(path) = &source.path else {
            continue;
        };
        if !path.is_file() {
            println!(
                "cargo:warning=asset '{}' not embedded: {} is not a file",
                source.name,
                path.display()
            );
            continue;
        }
        println!("cargo:rerun-if-changed={}", path.display());
        let literal = format!("{:?}", path.display().to_string());
        writeln!(
            table,
            "    EmbeddedAsset::new({:?}, include_bytes!({})),",
            source.name, literal
        )
        .expect("writing to a String cannot fail");
    }
    table.push_str("];\n");

    if sources[0].path.as_ref().map_or(true, |p| !p.is_file()) {
        println!("cargo:warning=libtcc1.a is not embedded; set CJIT_LIBTCC1 to its path");
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::write(out_dir.join("assets.rs"), table).expect("failed to write asset table");
}
