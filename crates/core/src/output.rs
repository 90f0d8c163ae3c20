//! Write-if-changed file output
//!
//! Build tools key incremental rebuilds off file modification times, so a
//! generated file is only rewritten when its bytes actually differ.

use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` to `path` unless the file already holds exactly those bytes.
///
/// Creates parent directories as needed. Returns `true` when the file was written.
pub fn write_if_changed(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<bool> {
    let contents = contents.as_ref();

    match fs::read(path) {
        Ok(existing) if existing == contents => {
            tracing::trace!("Unchanged {:?}", path);
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    tracing::debug!("Wrote {:?}", path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_if_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.rs");

        assert!(write_if_changed(&path, "fn a() {}").unwrap());
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!write_if_changed(&path, "fn a() {}").unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);

        assert!(write_if_changed(&path, "fn b() {}").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "fn b() {}");
    }
}
