//! Storage of uploaded files.
//!
//! Files are written to a temporary and persisted into place, so a crash
//! mid-write never leaves a partial file under the configured root.

use log::warn;
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::Storage;

/// An uploaded file, as received from the transport layer.
#[derive(Clone, Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Upload {
        Upload { bytes }
    }
}

/// Name under which a publication's cover image is stored.
///
/// Uploads are normalized to JPEG before storage, so stored names carry
/// a fixed extension.
pub fn cover_name(publication: i32) -> String {
    format!("portada_{}.jpg", publication)
}

/// Name under which a gallery image is stored.
pub fn gallery_name() -> String {
    format!("publicacion-{}.jpg", Uuid::new_v4())
}

/// Access to stored files, keyed by file name.
pub trait FileStore {
    /// Store `bytes` under `name`, replacing any previous content.
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Remove the file named `name`, if it exists.
    fn delete(&self, name: &str) -> io::Result<()>;

    fn exists(&self, name: &str) -> bool;

    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Remove `name`, logging instead of failing; used for best-effort
    /// cleanup of files replaced by a newer upload.
    fn delete_quietly(&self, name: &str) {
        if let Err(e) = self.delete(name) {
            warn!("Could not remove stored file {}: {}", name, e);
        }
    }
}

/// File store rooted at `[storage]`'s `path`.
#[derive(Clone, Debug)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(cfg: &Storage) -> DiskStore {
        DiskStore { root: cfg.path.clone() }
    }

    pub fn at<P: Into<PathBuf>>(root: P) -> DiskStore {
        DiskStore { root: root.into() }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileStore for DiskStore {
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.path_of(name))
            .map_err(|e| e.error)?;

        Ok(())
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            r => r,
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(name))
    }
}
