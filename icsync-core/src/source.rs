//! Document source abstraction.

use std::path::PathBuf;

use crate::error::SyncResult;

/// Fetches the raw source document by logical name.
pub trait DocumentSource {
    /// Returns the document text, or None when no such document exists.
    fn fetch(&self, name: &str) -> SyncResult<Option<String>>;
}

/// Document source backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSource { root: root.into() }
    }
}

impl DocumentSource for FileSource {
    fn fetch(&self, name: &str) -> SyncResult<Option<String>> {
        match std::fs::read_to_string(self.root.join(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
