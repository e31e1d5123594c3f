//! Copies embedded runtime libraries into a workspace.
//!
//! The compiler only finds its support archive (and the loader shim) as files, so
//! each asset is written byte for byte under its fixed name. There is no rollback:
//! files written before a failure are removed together with the workspace.

use crate::error::StagingFailure;
use crate::RuntimeError;
use cjit_assets::EmbeddedAsset;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Writes one file, returning how many bytes ended up on disk.
pub trait AssetWriter {
    fn write_asset(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<u64>;
}

/// Create-or-truncate writes to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl AssetWriter for FsWriter {
    fn write_asset(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<u64> {
        let mut file = File::create(dir.join(name))?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file.metadata()?.len())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

/// Writes every asset into `dir`, stopping at the first failure.
///
/// Returns the staged paths in the order of `assets`.
pub fn stage(dir: &Path, assets: &[EmbeddedAsset<'_>], writer: &dyn AssetWriter) -> Result<Vec<PathBuf>, RuntimeError> {
    let mut staged = Vec::with_capacity(assets.len());
    for asset in assets {
        let fail = |source: StagingFailure| RuntimeError::Staging {
            name: asset.name().to_owned(),
            dir: dir.to_path_buf(),
            source,
        };

        if !is_plain_file_name(asset.name()) {
            return Err(fail(StagingFailure::InvalidName(asset.name().to_owned())));
        }

        let written = writer
            .write_asset(dir, asset.name(), asset.bytes())
            .map_err(|e| fail(StagingFailure::Io(e)))?;
        let expected = asset.len() as u64;
        if written != expected {
            return Err(fail(StagingFailure::ShortWrite { expected, written }));
        }

        log::debug!("staged {} ({} bytes)", asset.name(), written);
        staged.push(dir.join(asset.name()));
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Writes only the first half of every asset.
    struct HalfWriter;

    impl AssetWriter for HalfWriter {
        fn write_asset(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<u64> {
            FsWriter.write_asset(dir, name, &bytes[..bytes.len() / 2])
        }
    }

    fn sample_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn staged_files_match_embedded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_bytes(4096);
        let shim = sample_bytes(777);
        let assets = [
            EmbeddedAsset::new("libtcc1.a", &archive),
            EmbeddedAsset::new("libc.so", &shim),
        ];

        let staged = stage(dir.path(), &assets, &FsWriter).unwrap();
        assert_eq!(staged, vec![dir.path().join("libtcc1.a"), dir.path().join("libc.so")]);
        for asset in &assets {
            let on_disk = fs::read(dir.path().join(asset.name())).unwrap();
            assert_eq!(on_disk.len(), asset.len());
            assert_eq!(on_disk, asset.bytes());
        }
    }

    #[test]
    fn existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("libtcc1.a"), vec![0xff; 10_000]).unwrap();
        let assets = [EmbeddedAsset::new("libtcc1.a", b"!<arch>\n")];

        stage(dir.path(), &assets, &FsWriter).unwrap();
        assert_eq!(fs::read(dir.path().join("libtcc1.a")).unwrap(), b"!<arch>\n");
    }

    #[test]
    fn embedded_assets_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let assets = cjit_assets::runtime_assets();
        stage(dir.path(), assets, &FsWriter).unwrap();
        for asset in assets {
            assert_eq!(fs::read(dir.path().join(asset.name())).unwrap(), asset.bytes());
        }
    }

    #[test]
    fn short_write_is_a_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = sample_bytes(100);
        let assets = [EmbeddedAsset::new("libtcc1.a", &bytes)];

        let err = stage(dir.path(), &assets, &HalfWriter).unwrap_err();
        match err {
            RuntimeError::Staging {
                name,
                source: StagingFailure::ShortWrite { expected, written },
                ..
            } => {
                assert_eq!(name, "libtcc1.a");
                assert_eq!((expected, written), (100, 50));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unwritable_directory_is_a_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let assets = [EmbeddedAsset::new("libtcc1.a", b"x")];

        let err = stage(&missing, &assets, &FsWriter).unwrap_err();
        assert!(matches!(err, RuntimeError::Staging { source: StagingFailure::Io(_), .. }));
    }

    #[test]
    fn first_failure_stops_staging() {
        let dir = tempfile::tempdir().unwrap();
        let assets = [
            EmbeddedAsset::new("libtcc1.a", b"archive"),
            EmbeddedAsset::new("../escape.so", b"shim"),
            EmbeddedAsset::new("libc.so", b"shim"),
        ];

        let err = stage(dir.path(), &assets, &FsWriter).unwrap_err();
        assert!(matches!(err, RuntimeError::Staging { source: StagingFailure::InvalidName(_), .. }));
        // Already written files stay behind for the workspace removal.
        assert!(dir.path().join("libtcc1.a").exists());
        assert!(!dir.path().join("libc.so").exists());
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("libtcc1.a"));
        assert!(!is_plain_file_name("a/b"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("/abs"));
        assert!(!is_plain_file_name(""));
    }
}
