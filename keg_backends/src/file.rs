//! JSON-file store.
//!
//! The whole document is kept in memory and rewritten on every change via a
//! temp file + rename, so a crash leaves either the old or the new version.

use crate::error::{Result, StoreError};
use crate::memory::Doc;
use keg_traits::{BoxError, KvStore};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    doc: Mutex<Doc>,
}

impl FileStore {
    /// Open `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Doc::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "store file missing, starting empty");
                Doc::default()
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, f: impl FnOnce(&mut Doc)) -> Result<()> {
        let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut doc);
        let bytes = serde_json::to_vec_pretty(&*doc)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, BoxError> {
        let doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(doc.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), BoxError> {
        self.mutate(|d| {
            d.values.insert(key.to_string(), value.to_string());
        })
        .map_err(Into::into)
    }

    fn append_event(&self, entry: &str, cap: usize) -> std::result::Result<(), BoxError> {
        self.mutate(|d| d.push_event(entry, cap)).map_err(Into::into)
    }

    fn events(&self) -> std::result::Result<Vec<String>, BoxError> {
        let doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(doc.events.iter().cloned().collect())
    }
}
