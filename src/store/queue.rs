//! Per-user URL queue store.
//!
//! One JSON file holding every user's pending links. The pipeline reads a
//! snapshot at queue start and removes each link as it completes; this
//! store does not interpret the links.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::error::Result;

/// One user's ordered, duplicate-free list of pending links
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQueue {
    /// Chat-platform user id
    pub user_id: String,
    /// Pending links, in submission order
    pub links: Vec<String>,
}

/// File-backed store of [`UserQueue`] entries
#[derive(Clone, Debug)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Create a store backed by the given file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load_all(&self) -> Result<Vec<UserQueue>> {
        Ok(super::read_json(&self.path).await?.unwrap_or_default())
    }

    async fn save_all(&self, queues: &[UserQueue]) -> Result<()> {
        super::write_json(&self.path, &queues).await
    }

    /// Get one user's queue; `None` when the user has no entry
    pub async fn get(&self, user_id: &str) -> Result<Option<UserQueue>> {
        let queues = self.load_all().await?;
        Ok(queues.into_iter().find(|q| q.user_id == user_id))
    }

    /// Append links to a user's queue, deduplicating while preserving
    /// submission order. Returns the number of links actually added.
    pub async fn add(&self, user_id: &str, links: &[String]) -> Result<usize> {
        let mut queues = self.load_all().await?;

        let entry = match queues.iter_mut().find(|q| q.user_id == user_id) {
            Some(entry) => entry,
            None => {
                queues.push(UserQueue {
                    user_id: user_id.to_string(),
                    links: Vec::new(),
                });
                // Just pushed, so the list is non-empty
                queues.last_mut().ok_or_else(|| {
                    crate::error::Error::Other("queue entry vanished after push".to_string())
                })?
            }
        };

        let before = entry.links.len();
        for link in links {
            let link = link.trim();
            if !link.is_empty() && !entry.links.iter().any(|l| l == link) {
                entry.links.push(link.to_string());
            }
        }
        let added = entry.links.len() - before;

        self.save_all(&queues).await?;
        info!(user_id, added, "queued links");
        Ok(added)
    }

    /// Remove the given links from a user's queue, dropping the entry when
    /// it becomes empty. Returns the number of links actually removed.
    pub async fn remove(&self, user_id: &str, links: &[String]) -> Result<usize> {
        let mut queues = self.load_all().await?;

        let mut removed = 0;
        if let Some(entry) = queues.iter_mut().find(|q| q.user_id == user_id) {
            let before = entry.links.len();
            entry.links.retain(|l| !links.iter().any(|r| r == l));
            removed = before - entry.links.len();
        }
        queues.retain(|q| !q.links.is_empty());

        self.save_all(&queues).await?;
        Ok(removed)
    }

    /// Drop a user's entire queue entry. Idempotent.
    pub async fn clear(&self, user_id: &str) -> Result<()> {
        let mut queues = self.load_all().await?;
        queues.retain(|q| q.user_id != user_id);
        self.save_all(&queues).await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> QueueStore {
        QueueStore::new(dir.path().join("queue.json"))
    }

    #[tokio::test]
    async fn add_preserves_order_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let added = store
            .add(
                "u1",
                &[
                    "https://example.com/a".to_string(),
                    "https://example.com/b".to_string(),
                    "https://example.com/a".to_string(),
                    "  https://example.com/c  ".to_string(),
                ],
            )
            .await
            .unwrap();
        assert_eq!(added, 3);

        let queue = store.get("u1").await.unwrap().unwrap();
        assert_eq!(
            queue.links,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
    }

    #[tokio::test]
    async fn remove_drops_empty_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .add("u1", &["https://example.com/a".to_string()])
            .await
            .unwrap();
        let removed = store
            .remove("u1", &["https://example.com/a".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn queues_are_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .add("u1", &["https://example.com/a".to_string()])
            .await
            .unwrap();
        store
            .add("u2", &["https://example.com/b".to_string()])
            .await
            .unwrap();

        store.clear("u1").await.unwrap();
        assert!(store.get("u1").await.unwrap().is_none());
        assert_eq!(
            store.get("u2").await.unwrap().unwrap().links,
            vec!["https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(store.get("nobody").await.unwrap().is_none());
        assert_eq!(store.remove("nobody", &[]).await.unwrap(), 0);
    }
}
