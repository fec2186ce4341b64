use async_trait::async_trait;

use super::MemoryStore;
use crate::common::error::Result;
use crate::persistence::traits::CoordinationStore;

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        Ok(self.data.remove(key).map_or(0, |_| 1))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut items: Vec<(String, String)> = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        // DashMap 遍历无序
        items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_delete_reports_count() {
        let store = MemoryStore::new();
        store.put("/a/1", "x").await.unwrap();
        store.put("/a/1", "y").await.unwrap();
        assert_eq!(store.get("/a/1").await.unwrap().as_deref(), Some("y"));

        assert_eq!(store.delete("/a/1").await.unwrap(), 1);
        assert_eq!(store.delete("/a/1").await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn scan_is_sorted_and_prefix_bound() {
        let store = MemoryStore::new();
        store.put("/r/job/2", "b").await.unwrap();
        store.put("/r/job/1", "a").await.unwrap();
        store.put("/r/jobx/1", "c").await.unwrap();

        let items = store.scan_prefix("/r/job/").await.unwrap();
        assert_eq!(
            items,
            vec![
                ("/r/job/1".to_string(), "a".to_string()),
                ("/r/job/2".to_string(), "b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn clones_share_data() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put("k", "v").await.unwrap();
        assert_eq!(other.len(), 1);
    }
}
