//! 本地附件缓存：单个 JSON 文件，内容为 `[{id, attachment}]`
//!
//! 每次写入都整体重写文件（先写临时文件再原子重命名），
//! 读-改-写过程由进程内的异步互斥锁串行化。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use application::{ApplicationError, AttachmentStore};
use async_trait::async_trait;
use domain::AttachmentRecord;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct JsonFileAttachmentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileAttachmentStore {
    /// 打开缓存文件，不存在时以 `[]` 创建
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ApplicationError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        match fs::metadata(&store.path).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                store.persist(&[]).await?;
                info!(path = %store.path.display(), "附件缓存文件已创建");
            }
            Err(err) => return Err(io_error(err)),
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<AttachmentRecord>, ApplicationError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(err)),
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&raw).map_err(|err| {
            ApplicationError::storage(format!("corrupt cache file {}: {err}", self.path.display()))
        })
    }

    async fn persist(&self, records: &[AttachmentRecord]) -> Result<(), ApplicationError> {
        let encoded = serde_json::to_vec(records)
            .map_err(|err| ApplicationError::storage(err.to_string()))?;
        let temp = self.temp_path();
        fs::write(&temp, encoded).await.map_err(io_error)?;
        fs::rename(&temp, &self.path).await.map_err(io_error)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachments.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

fn io_error(err: std::io::Error) -> ApplicationError {
    ApplicationError::storage(err.to_string())
}

#[async_trait]
impl AttachmentStore for JsonFileAttachmentStore {
    async fn has(&self, key: &str) -> Result<bool, ApplicationError> {
        Ok(self.load().await?.iter().any(|record| record.id == key))
    }

    async fn read(&self, key: &str) -> Result<String, ApplicationError> {
        self.load()
            .await?
            .into_iter()
            .find(|record| record.id == key)
            .map(|record| record.attachment)
            .ok_or_else(|| ApplicationError::not_found(key))
    }

    async fn write(&self, key: &str, payload: String) -> Result<(), ApplicationError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        match records.iter_mut().find(|record| record.id == key) {
            Some(existing) => existing.attachment = payload,
            None => records.push(AttachmentRecord {
                id: key.to_string(),
                attachment: payload,
            }),
        }

        self.persist(&records).await?;
        debug!(attachment = %key, entries = records.len(), "附件缓存已写入");
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApplicationError> {
        let _guard = self.write_lock.lock().await;
        self.persist(&[]).await?;
        info!(path = %self.path.display(), "附件缓存已清空");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store_in(dir: &tempfile::TempDir) -> JsonFileAttachmentStore {
        JsonFileAttachmentStore::open(dir.path().join("attachments.json"))
            .await
            .expect("open store")
    }

    #[tokio::test]
    async fn creates_empty_array_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "[]");
        assert!(!store.has("anything").await.unwrap());
    }

    #[tokio::test]
    async fn write_upserts_with_last_write_winning() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.write("a", "first".to_string()).await.unwrap();
        store.write("b", "other".to_string()).await.unwrap();
        store.write("a", "second".to_string()).await.unwrap();

        assert_eq!(store.read("a").await.unwrap(), "second");
        let records: Vec<AttachmentRecord> =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.iter().filter(|r| r.id == "a").count(), 1);
    }

    #[tokio::test]
    async fn read_of_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let err = store.read("missing").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn clear_wipes_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store.write("a", "x".to_string()).await.unwrap();

        store.clear().await.unwrap();

        assert!(!store.has("a").await.unwrap());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[tokio::test]
    async fn concurrent_writes_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir).await);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.write(&format!("key-{i}"), format!("v{i}")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for i in 0..16 {
            assert_eq!(store.read(&format!("key-{i}")).await.unwrap(), format!("v{i}"));
        }
    }

    #[tokio::test]
    async fn reopening_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).await.write("kept", "payload".to_string()).await.unwrap();

        let reopened = store_in(&dir).await;
        assert_eq!(reopened.read("kept").await.unwrap(), "payload");
    }
}
