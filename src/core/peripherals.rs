//! Shared list of discovered peripherals

use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered list of peripheral identifiers found by discovery
///
/// Discovery is the only writer and only ever appends; readers take whole
/// snapshots so an index check never sees a half-updated list.
#[derive(Debug, Clone, Default)]
pub struct PeripheralList {
    inner: Arc<RwLock<Vec<String>>>,
}

impl PeripheralList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `identifier` unless already present
    ///
    /// Returns the index of a newly added entry.
    pub async fn push(&self, identifier: String) -> Option<usize> {
        let mut list = self.inner.write().await;
        if list.contains(&identifier) {
            return None;
        }
        list.push(identifier);
        Some(list.len() - 1)
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> Vec<String> {
        self.inner.read().await.clone()
    }

    /// Forget everything, ready for a new discovery session
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_assigns_positions() {
        let list = PeripheralList::new();
        assert!(list.snapshot().await.is_empty());

        assert_eq!(list.push("AA".into()).await, Some(0));
        assert_eq!(list.push("BB".into()).await, Some(1));
        assert_eq!(list.push("AA".into()).await, None);

        assert_eq!(list.snapshot().await, vec!["AA".to_string(), "BB".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let list = PeripheralList::new();
        list.push("AA".into()).await;

        let snapshot = list.snapshot().await;
        list.push("BB".into()).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(list.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let list = PeripheralList::new();
        let writer = list.clone();

        let task = tokio::spawn(async move {
            for i in 0..50 {
                writer.push(format!("device-{i}")).await;
            }
        });

        // Every snapshot is a prefix of the final list
        let early = list.snapshot().await;
        task.await.unwrap();
        let complete = list.snapshot().await;

        assert_eq!(complete.len(), 50);
        assert_eq!(&complete[..early.len()], early.as_slice());
    }

    #[tokio::test]
    async fn test_clear() {
        let list = PeripheralList::new();
        list.push("AA".into()).await;
        list.clear().await;
        assert!(list.snapshot().await.is_empty());
    }
}
