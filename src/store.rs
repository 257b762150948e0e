use crate::errors::StoreError;
use crate::models::{StoreData, Task, TaskMap, TaskPatch};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, watch};
use tracing::{error, info};

/// Keyed task collection with push-style change notification.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Receiver that always holds the latest `id -> task` map.
    fn subscribe(&self) -> watch::Receiver<TaskMap>;

    async fn write(&self, id: &str, task: Task) -> Result<(), StoreError>;

    async fn patch(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Store backed by a single pretty-printed JSON file. A change is published
/// to subscribers only after it has been written to disk.
pub struct JsonFileStore {
    path: PathBuf,
    tasks: Mutex<TaskMap>,
    changes: watch::Sender<TaskMap>,
}

impl JsonFileStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        info!(tasks = data.todos.len(), path = %path.display(), "loaded task store");
        let (changes, _) = watch::channel(data.todos.clone());
        Self {
            path,
            tasks: Mutex::new(data.todos),
            changes,
        }
    }

    async fn commit<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut TaskMap) -> Result<(), StoreError> + Send,
    {
        let mut tasks = self.tasks.lock().await;
        let mut next = tasks.clone();
        mutate(&mut next)?;

        let data = StoreData { todos: next };
        persist_data(&self.path, &data).await?;

        *tasks = data.todos;
        self.changes.send_replace(tasks.clone());
        Ok(())
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    fn subscribe(&self) -> watch::Receiver<TaskMap> {
        self.changes.subscribe()
    }

    async fn write(&self, id: &str, task: Task) -> Result<(), StoreError> {
        self.commit(|tasks| {
            tasks.insert(id.to_string(), task);
            Ok(())
        })
        .await
    }

    async fn patch(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        self.commit(|tasks| {
            let task = tasks
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            patch.apply(task);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.commit(|tasks| {
            tasks.remove(id);
            Ok(())
        })
        .await
    }
}

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                StoreData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            StoreData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}
