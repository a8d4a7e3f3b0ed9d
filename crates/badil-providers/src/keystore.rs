//! Credential stores — durable source of truth for key availability.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use badil_core::error::{BadilError, Result};
use badil_core::types::ApiKey;

/// Registry of provisioned provider credentials.
///
/// `list_candidates` applies no filtering — eligibility is the rotation
/// policy's job. `retire` must be idempotent and safe under concurrent
/// invocation for the same key.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// All provisioned credentials in stable insertion order.
    async fn list_candidates(&self) -> Result<Vec<ApiKey>>;

    /// Take a credential out of service as of now. Retiring an
    /// already-retired credential is a no-op that still succeeds, and it
    /// keeps the earlier timestamp so concurrent failures on the same key
    /// cannot push its cooldown out.
    async fn retire(&self, key: &ApiKey) -> Result<()>;
}

fn same_key(a: &ApiKey, b: &ApiKey) -> bool {
    a.provider == b.provider && a.secret == b.secret
}

/// File-based key store: a single JSON array, written atomically.
///
/// Layout mirrors the catalog store — `<path>` holds `Vec<ApiKey>`.
pub struct JsonKeyStore {
    path: PathBuf,
}

impl JsonKeyStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<Vec<ApiKey>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| BadilError::StorageUnavailable(format!("{}: {e}", self.path.display())))?;
        let keys: Vec<ApiKey> = serde_json::from_str(&data)
            .map_err(|e| BadilError::StorageUnavailable(format!("corrupt key store: {e}")))?;
        Ok(keys)
    }

    async fn save(&self, keys: &[ApiKey]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BadilError::StorageUnavailable(e.to_string()))?;
        }
        let data = serde_json::to_string_pretty(keys)?;
        // Atomic write: write to temp then rename
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data.as_bytes())
            .await
            .map_err(|e| BadilError::StorageUnavailable(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| BadilError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    /// Append a credential (administrative provisioning).
    pub async fn add(&self, key: ApiKey) -> Result<()> {
        let mut keys = self.load().await?;
        keys.push(key);
        self.save(&keys).await
    }
}

#[async_trait]
impl KeyStore for JsonKeyStore {
    async fn list_candidates(&self) -> Result<Vec<ApiKey>> {
        self.load().await
    }

    async fn retire(&self, key: &ApiKey) -> Result<()> {
        let mut keys = self.load().await?;
        match keys.iter_mut().find(|k| same_key(k, key)) {
            Some(found) if found.retired_at.is_none() => {
                found.retired_at = Some(Utc::now());
                self.save(&keys).await?;
                debug!(key = %key.redacted(), "Retired credential");
            }
            Some(_) => {
                debug!(key = %key.redacted(), "Credential already retired");
            }
            None => {
                warn!(key = %key.redacted(), "Retire requested for unknown credential");
            }
        }
        Ok(())
    }
}

/// In-memory key store for tests and one-shot runs.
pub struct MemoryKeyStore {
    keys: RwLock<Vec<ApiKey>>,
}

impl MemoryKeyStore {
    pub fn new(keys: Vec<ApiKey>) -> Self {
        Self {
            keys: RwLock::new(keys),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn list_candidates(&self) -> Result<Vec<ApiKey>> {
        Ok(self.keys.read().await.clone())
    }

    async fn retire(&self, key: &ApiKey) -> Result<()> {
        let mut keys = self.keys.write().await;
        if let Some(found) = keys.iter_mut().find(|k| same_key(k, key)) {
            if found.retired_at.is_none() {
                found.retired_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badil_core::types::ProviderKind;

    fn groq_key(secret: &str) -> ApiKey {
        ApiKey::new(ProviderKind::Groq, secret, "llama-3.2-90b-vision-preview")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeyStore::new(dir.path().join("keys.json"));
        assert!(store.list_candidates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeyStore::new(dir.path().join("keys.json"));

        store.add(groq_key("first")).await.unwrap();
        store.add(groq_key("second")).await.unwrap();
        store.add(groq_key("third")).await.unwrap();

        let keys = store.list_candidates().await.unwrap();
        let secrets: Vec<&str> = keys.iter().map(|k| k.secret.as_str()).collect();
        assert_eq!(secrets, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_retire_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        let store = JsonKeyStore::new(path.clone());
        store.add(groq_key("k1")).await.unwrap();

        store.retire(&groq_key("k1")).await.unwrap();

        // A fresh store instance sees the write.
        let reopened = JsonKeyStore::new(path);
        let keys = reopened.list_candidates().await.unwrap();
        assert!(keys[0].retired_at.is_some());
    }

    #[tokio::test]
    async fn test_retire_twice_keeps_first_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeyStore::new(dir.path().join("keys.json"));
        store.add(groq_key("k1")).await.unwrap();

        store.retire(&groq_key("k1")).await.unwrap();
        let first = store.list_candidates().await.unwrap()[0].retired_at;

        store.retire(&groq_key("k1")).await.unwrap();
        let second = store.list_candidates().await.unwrap()[0].retired_at;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_retire_unknown_key_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKeyStore::new(dir.path().join("keys.json"));
        store.retire(&groq_key("nope")).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_store_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonKeyStore::new(path);
        let err = store.list_candidates().await.unwrap_err();
        assert!(matches!(err, BadilError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_memory_store_retire() {
        let store = MemoryKeyStore::new(vec![groq_key("a"), groq_key("b")]);
        store.retire(&groq_key("a")).await.unwrap();

        let keys = store.list_candidates().await.unwrap();
        assert!(keys[0].retired_at.is_some());
        assert!(keys[1].retired_at.is_none());
    }
}
