//! Document persistence.
//!
//! A [`DocumentStore`] keeps [`DocumentRecord`]s between pipeline calls so
//! that redaction actions, decisions and re-rendering can run later against
//! the same document. Two stores are provided: [`MemoryStore`] for tests and
//! short-lived processes, and [`DirectoryStore`] which writes one JSON file
//! per document.

use crate::error::{Error, Result};
use crate::model::DocumentRecord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

/// Storage for document records.
pub trait DocumentStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Load a document. Missing documents are [`Error::DocumentNotFound`].
    fn load(&self, id: &str) -> Result<DocumentRecord>;

    /// Insert or replace a document.
    fn save(&self, doc: &DocumentRecord) -> Result<()>;

    /// Remove a document. Missing documents are [`Error::DocumentNotFound`].
    fn delete(&self, id: &str) -> Result<()>;

    /// Ids of all stored documents, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Check whether a document exists.
    fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|d| d == id))
    }
}

fn poisoned() -> Error {
    Error::Other("document store lock poisoned".to_string())
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, DocumentRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, id: &str) -> Result<DocumentRecord> {
        self.docs
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    fn save(&self, doc: &DocumentRecord) -> Result<()> {
        self.docs
            .write()
            .map_err(|_| poisoned())?
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.docs
            .write()
            .map_err(|_| poisoned())?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .docs
            .read()
            .map_err(|_| poisoned())?
            .keys()
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.docs.read().map_err(|_| poisoned())?.contains_key(id))
    }
}

/// Store writing `<id>.json` files into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.contains("..");
        if !valid {
            return Err(Error::InvalidAction(format!("invalid document id: {}", id)));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

impl DocumentStore for DirectoryStore {
    fn name(&self) -> &str {
        "directory"
    }

    fn load(&self, id: &str) -> Result<DocumentRecord> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(Error::DocumentNotFound(id.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, doc: &DocumentRecord) -> Result<()> {
        let path = self.path_for(&doc.id)?;
        let body = serde_json::to_string_pretty(doc)?;
        // One temp file per call; concurrent saves of an id must not share it
        let tmp = self.root.join(format!(".{}.{}.tmp", doc.id, Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::debug!("Saved document {} to {}", doc.id, path.display());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(Error::DocumentNotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
