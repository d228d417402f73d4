use log::{debug, warn};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::{DOWNLOAD_CHUNK_SIZE, TEMP_SUFFIX};

pub fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        debug!("Directory {:?} does not exist, creating...", path);
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Sibling temp file: `name.ext` -> `name.ext.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Write `contents` to `path` so readers only ever see the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    write_via_temp(path, |file| file.write_all(contents))
}

/// Stream `reader` into `path` through a temp file in fixed-size chunks.
/// Returns the number of bytes written.
pub fn write_atomic_from_reader(path: &Path, reader: &mut dyn Read) -> io::Result<u64> {
    write_via_temp(path, |file| {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            file.write_all(&buf[..n])?;
            written += n as u64;
        }
        Ok(written)
    })
}

fn write_via_temp<T>(path: &Path, fill: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
    let temp_path = temp_path_for(path);
    remove_if_present(&temp_path)?;

    let filled = File::create(&temp_path).and_then(|mut file| {
        let out = fill(&mut file)?;
        file.flush()?;
        file.sync_all()?;
        Ok(out)
    });

    let out = match filled {
        Ok(out) => out,
        Err(e) => {
            discard_temp(&temp_path);
            return Err(e);
        }
    };

    if let Err(e) = commit(&temp_path, path) {
        discard_temp(&temp_path);
        return Err(e);
    }

    Ok(out)
}

fn commit(temp_path: &Path, path: &Path) -> io::Result<()> {
    match fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        // some platforms refuse to rename over an existing file
        Err(e) if path.is_file() => {
            debug!("Rename over {:?} failed ({}), replacing it", path, e);
            fs::remove_file(path)?;
            fs::rename(temp_path, path)
        }
        Err(e) => Err(e),
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale temp file {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn discard_temp(temp_path: &Path) {
    if let Err(e) = remove_if_present(temp_path) {
        warn!("Could not remove temp file {:?}: {}", temp_path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_path_for() {
        assert_eq!(
            temp_path_for(Path::new("/out/UgAbc.json")),
            PathBuf::from("/out/UgAbc.json.tmp")
        );
    }

    #[test]
    fn test_write_atomic_replaces_existing_and_stale_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("UgAbc.json");
        fs::write(&path, "old").unwrap();
        fs::write(temp_path_for(&path), "half-written garbage").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_write_leaves_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("UgAbc.json");
        fs::write(&path, "old").unwrap();
        // a directory squatting on the temp path can't be removed as a file
        fs::create_dir(temp_path_for(&path)).unwrap();

        assert!(write_atomic(&path, b"new").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_failed_fill_removes_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.jpg");

        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
            }
        }

        assert!(write_atomic_from_reader(&path, &mut Broken).is_err());
        assert!(!path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_write_atomic_from_reader_counts_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let payload = vec![7u8; DOWNLOAD_CHUNK_SIZE * 3 + 11];

        let written = write_atomic_from_reader(&path, &mut payload.as_slice()).unwrap();
        assert_eq!(written, payload.len() as u64);
        assert_eq!(fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_ensure_dir_exists_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir_exists(&nested).unwrap();
    }
}
