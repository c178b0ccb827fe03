use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use crate::errors::ServiceError;

/// Result of a map mutation; only `Changed` is written back to disk.
pub enum MapUpdate<T> {
    Changed(T),
    Unchanged(T),
}

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file. Mutations run under the write
/// lock and are flushed before the lock is released, so a reader never sees
/// a state that is not on disk.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path).await.map_err(|e| ServiceError::Db(e.to_string()))?;

        let map: HashMap<K, V> = match read_file(&file_path).await? {
            Some(map) => map,
            None => {
                let empty: HashMap<K, V> = HashMap::new();
                write_file(&file_path, &empty).await?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Run a read-only closure against the map.
    pub async fn view<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&HashMap<K, V>) -> T,
    {
        let map = self.inner.read().await;
        f(&map)
    }

    /// Apply a mutation and persist it atomically with respect to other callers.
    ///
    /// On failure the in-memory map is reloaded from the last flushed file.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<MapUpdate<T>, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let result = match f(&mut map) {
            Ok(MapUpdate::Unchanged(out)) => return Ok(out),
            Ok(MapUpdate::Changed(out)) => write_file(&self.file_path, &*map).await.map(|()| out),
            Err(e) => Err(e),
        };
        if result.is_err() {
            match read_file(&self.file_path).await {
                Ok(Some(flushed)) => *map = flushed,
                Ok(None) => map.clear(),
                Err(e) => warn!(path = %self.file_path.display(), error = %e, "cannot reload store after failed update"),
            }
        }
        result
    }
}

/// `None` when the file does not exist.
async fn read_file<K, V>(path: &PathBuf) -> Result<Option<HashMap<K, V>>, ServiceError>
where
    K: Eq + Hash + serde::de::DeserializeOwned,
    V: serde::de::DeserializeOwned,
{
    match fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(Some(HashMap::new())),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ServiceError::Corrupt(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServiceError::Db(e.to_string())),
    }
}

async fn write_file<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), ServiceError> {
    let data = serde_json::to_vec(value).map_err(|e| ServiceError::Db(e.to_string()))?;
    // write-then-rename so a crash mid-write leaves the previous file intact
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    fs::rename(&tmp, path).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}
