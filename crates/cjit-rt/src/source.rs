use crate::RuntimeError;
use std::fs;
use std::path::Path;

/// Reads the whole source file.
///
/// Bytes are passed to the compiler untouched, so sources need not be UTF-8.
pub fn load_source(path: &Path) -> Result<Vec<u8>, RuntimeError> {
    let text = fs::read(path).map_err(|source| RuntimeError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.c");
        fs::write(&path, "int main(void){ return 0; }\n").unwrap();
        assert_eq!(load_source(&path).unwrap(), b"int main(void){ return 0; }\n");
    }

    #[test]
    fn non_utf8_source_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.c");
        fs::write(&path, b"/* caf\xe9 */ int main(void){ return 0; }").unwrap();
        assert!(load_source(&path).is_ok());
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.c");
        match load_source(&path).unwrap_err() {
            RuntimeError::SourceNotFound { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn directory_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_source(dir.path()), Err(RuntimeError::SourceNotFound { .. })));
    }
}
