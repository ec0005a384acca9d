use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::directory::domain::StoredEntry;
use crate::errors::DirectoryError;
use super::UserStore;

/// JSON file holding the whole user collection as one array.
///
/// Nothing is cached: every `load` reads the file again, every `save_all`
/// rewrites it completely through a temporary sibling that is renamed over
/// the target, so a reader sees either the old or the new content.
///
/// Every store opened on the same file shares one write lock, so services
/// built over separate handles still serialize their rewrites.
#[derive(Debug, Clone)]
pub struct JsonArrayStore {
    file_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

static WRITE_LOCKS: Lazy<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| std::sync::Mutex::new(HashMap::new()));

/// Lock registered for `key`, created on first use.
fn lock_for(key: PathBuf) -> Arc<Mutex<()>> {
    let mut locks = WRITE_LOCKS.lock().unwrap_or_else(|p| p.into_inner());
    locks.entry(key).or_default().clone()
}

impl JsonArrayStore {
    /// Open the store at `path`, creating parent directories and an empty
    /// array file when missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, DirectoryError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        if fs::metadata(&file_path).await.is_err() {
            write_atomic(&file_path, b"[]\n").await?;
        }
        let key = fs::canonicalize(&file_path).await.unwrap_or_else(|_| file_path.clone());
        let write_lock = lock_for(key);
        Ok(Arc::new(Self { file_path, write_lock }))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

async fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), DirectoryError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".into());
    let tmp = target.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Decode stored bytes leniently: anything that is not a JSON array counts as
/// empty. Every array element is kept in place; ones that are not user
/// objects are carried as raw values.
fn decode_entries(bytes: &[u8], path: &Path) -> Vec<StoredEntry> {
    let items = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(path = %path.display(), "store does not hold a JSON array; treating as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store is not valid JSON; treating as empty");
            return Vec::new();
        }
    };
    let entries: Vec<StoredEntry> = items.into_iter().map(StoredEntry::from_value).collect();
    let foreign = entries.iter().filter(|e| e.user().is_none()).count();
    if foreign > 0 {
        debug!(path = %path.display(), foreign, "store holds entries that are not user records");
    }
    entries
}

/// Pretty-printed with four-space indentation, newline-terminated.
fn encode_entries(entries: &[StoredEntry]) -> Result<Vec<u8>, DirectoryError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

#[async_trait]
impl UserStore for JsonArrayStore {
    async fn load(&self) -> Result<Vec<StoredEntry>, DirectoryError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) => Ok(decode_entries(&bytes, &self.file_path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "store missing; initialising empty array");
                write_atomic(&self.file_path, b"[]\n").await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_all(&self, entries: &[StoredEntry]) -> Result<(), DirectoryError> {
        let bytes = encode_entries(entries)?;
        write_atomic(&self.file_path, &bytes).await?;
        debug!(path = %self.file_path.display(), count = entries.len(), "store rewritten");
        Ok(())
    }

    fn write_lock(&self) -> Arc<Mutex<()>> {
        self.write_lock.clone()
    }
}
