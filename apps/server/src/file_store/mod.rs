//! Legacy JSON file backend.
//!
//! One file per entity type, each holding a JSON array of records. Every
//! mutation rewrites the whole file: the new contents go to a temp file that
//! is then renamed over the old one. Mutations of one file are serialised by
//! an in-process lock held across read-modify-write; other processes writing
//! the same directory are not coordinated with.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::EntityKind;

mod entities;

/// A record stored in one of the collection files.
pub(crate) trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

pub struct FileStore {
    data_dir: PathBuf,
    locks: [Mutex<()>; 7],
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Create the data directory if it does not exist yet.
    pub async fn ensure_data_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            AppError::FileStorage(format!(
                "Failed to create data directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// Read a whole collection. A missing or empty file is an empty collection.
    pub(crate) async fn load<T: Record>(&self) -> AppResult<Vec<T>> {
        let path = self.path(T::KIND);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::FileStorage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::FileStorage(format!("Corrupt {}: {}", path.display(), e)))
    }

    async fn save<T: Record>(&self, records: &[T]) -> AppResult<()> {
        let path = self.path(T::KIND);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(records).map_err(|e| {
            AppError::FileStorage(format!("Failed to serialize {}: {}", T::KIND, e))
        })?;

        tokio::fs::write(&tmp, bytes).await.map_err(|e| {
            AppError::FileStorage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            AppError::FileStorage(format!("Failed to replace {}: {}", path.display(), e))
        })
    }

    /// Run `f` over the collection while holding its lock. The file is only
    /// rewritten when `f` reports a change.
    pub(crate) async fn mutate<T, R, F>(&self, f: F) -> AppResult<R>
    where
        T: Record,
        F: FnOnce(&mut Vec<T>) -> AppResult<(R, bool)>,
    {
        let _guard = self.locks[T::KIND as usize].lock().await;
        let mut records = self.load::<T>().await?;
        let (result, changed) = f(&mut records)?;
        if changed {
            self.save(&records).await?;
        }
        Ok(result)
    }

    pub(crate) async fn find<T: Record>(&self, id: &str) -> AppResult<Option<T>> {
        Ok(self.load::<T>().await?.into_iter().find(|r| r.id() == id))
    }

    pub(crate) async fn filter<T, P>(&self, predicate: P) -> AppResult<Vec<T>>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let mut records = self.load::<T>().await?;
        records.retain(|r| predicate(r));
        Ok(records)
    }

    /// Append a new record. An id that is already present is rejected.
    pub(crate) async fn insert<T: Record>(&self, record: &T) -> AppResult<T> {
        self.mutate(|records: &mut Vec<T>| {
            if records.iter().any(|r| r.id() == record.id()) {
                return Err(AppError::ConstraintViolation(format!(
                    "{} record '{}' already exists",
                    T::KIND,
                    record.id()
                )));
            }
            records.push(record.clone());
            Ok((record.clone(), true))
        })
        .await
    }

    /// Apply `f` to the record with `id`, if present.
    pub(crate) async fn modify<T, F>(&self, id: &str, f: F) -> AppResult<Option<T>>
    where
        T: Record,
        F: FnOnce(&mut T) -> AppResult<()>,
    {
        self.mutate(|records: &mut Vec<T>| {
            let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
                return Ok((None, false));
            };
            f(record)?;
            Ok((Some(record.clone()), true))
        })
        .await
    }

    pub(crate) async fn remove<T: Record>(&self, id: &str) -> AppResult<bool> {
        self.mutate(|records: &mut Vec<T>| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            let removed = records.len() != before;
            Ok((removed, removed))
        })
        .await
    }

    /// Insert or replace by id.
    pub(crate) async fn upsert<T: Record>(&self, record: &T) -> AppResult<()> {
        self.mutate(|records: &mut Vec<T>| {
            match records.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
            Ok(((), true))
        })
        .await
    }
}
