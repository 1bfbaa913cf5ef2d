//! Locally persisted bookmark set.
//!
//! Stored as one JSON array of full article snapshots under
//! [`keys::BOOKMARKS`], newest first. Every mutation writes the complete new
//! array before the in-memory copy is swapped, so what is shown is always
//! what is on disk.

use std::collections::HashSet;

use crate::api::Article;

use super::schema::Database;
use super::types::{keys, DatabaseError};

pub struct BookmarkStore {
    db: Database,
    items: Vec<Article>,
    ids: HashSet<String>,
}

impl BookmarkStore {
    /// Loads the persisted set.
    ///
    /// A read or decode failure is logged and yields an empty set; bookmarks
    /// never block startup.
    pub async fn load(db: Database) -> Self {
        let stored = match db.get_json::<Vec<Article>>(keys::BOOKMARKS).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load bookmarks, starting empty");
                Vec::new()
            }
        };

        let mut store = Self {
            db,
            items: Vec::with_capacity(stored.len()),
            ids: HashSet::with_capacity(stored.len()),
        };
        // Older writers may have left duplicates; first occurrence wins.
        for article in stored {
            if store.ids.insert(article.id.clone()) {
                store.items.push(article);
            }
        }
        tracing::debug!(count = store.items.len(), "Bookmarks loaded");
        store
    }

    /// Bookmarked articles, most recently added first.
    pub fn list(&self) -> &[Article] {
        &self.items
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `article` at the front. Returns `Ok(false)` if it was already
    /// bookmarked.
    pub async fn add(&mut self, article: Article) -> Result<bool, DatabaseError> {
        if self.ids.contains(&article.id) {
            return Ok(false);
        }

        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(article);
        next.extend(self.items.iter().cloned());
        self.commit(next).await?;
        Ok(true)
    }

    /// Removes the bookmark with `id`. Returns `Ok(false)` if there was none.
    pub async fn remove(&mut self, id: &str) -> Result<bool, DatabaseError> {
        if !self.ids.contains(id) {
            return Ok(false);
        }

        let next: Vec<Article> = self.items.iter().filter(|a| a.id != id).cloned().collect();
        self.commit(next).await?;
        Ok(true)
    }

    /// Adds or removes `article`, returning whether it is now bookmarked.
    pub async fn toggle(&mut self, article: &Article) -> Result<bool, DatabaseError> {
        if self.is_bookmarked(&article.id) {
            self.remove(&article.id).await.map(|_| false)
        } else {
            self.add(article.clone()).await.map(|_| true)
        }
    }

    /// Removes every bookmark.
    pub async fn clear(&mut self) -> Result<usize, DatabaseError> {
        let removed = self.items.len();
        if removed > 0 {
            self.commit(Vec::new()).await?;
        }
        Ok(removed)
    }

    async fn commit(&mut self, next: Vec<Article>) -> Result<(), DatabaseError> {
        if let Err(e) = self.db.set_json(keys::BOOKMARKS, &next).await {
            tracing::warn!(error = %e, "Failed to persist bookmarks, keeping previous set");
            return Err(e);
        }
        self.ids = next.iter().map(|a| a.id.clone()).collect();
        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {id}"),
            summary: Some("summary".into()),
            source: "TechCrunch".into(),
            source_url: None,
            url: format!("https://example.com/{id}"),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        }
    }

    fn ids(store: &BookmarkStore) -> Vec<&str> {
        store.list().iter().map(|a| a.id.as_str()).collect()
    }

    async fn fresh() -> (Database, BookmarkStore) {
        let db = Database::open(":memory:").await.unwrap();
        let store = BookmarkStore::load(db.clone()).await;
        (db, store)
    }

    #[tokio::test]
    async fn test_add_is_newest_first_and_idempotent() {
        let (_db, mut store) = fresh().await;
        assert!(store.add(article("a")).await.unwrap());
        assert!(store.add(article("b")).await.unwrap());
        assert!(!store.add(article("a")).await.unwrap());

        assert_eq!(ids(&store), vec!["b", "a"]);
        assert!(store.is_bookmarked("a"));
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let (_db, mut store) = fresh().await;
        store.add(article("a")).await.unwrap();
        assert!(!store.remove("zzz").await.unwrap());
        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_toggle() {
        let (_db, mut store) = fresh().await;
        let a = article("a");
        assert!(store.toggle(&a).await.unwrap());
        assert!(!store.toggle(&a).await.unwrap());
        assert!(!store.is_bookmarked("a"));
    }

    #[tokio::test]
    async fn test_reload_reproduces_order_and_snapshots() {
        let (db, mut store) = fresh().await;
        for id in ["a", "b", "c"] {
            store.add(article(id)).await.unwrap();
        }
        store.remove("b").await.unwrap();

        let reloaded = BookmarkStore::load(db).await;
        assert_eq!(ids(&reloaded), vec!["c", "a"]);
        assert_eq!(reloaded.list()[1], article("a"));
    }

    #[tokio::test]
    async fn test_clear() {
        let (db, mut store) = fresh().await;
        store.add(article("a")).await.unwrap();
        store.add(article("b")).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.is_empty());
        assert!(BookmarkStore::load(db).await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_memory_unchanged() {
        let (db, mut store) = fresh().await;
        store.add(article("a")).await.unwrap();

        db.close().await;

        assert!(store.add(article("b")).await.is_err());
        assert!(store.remove("a").await.is_err());
        assert_eq!(ids(&store), vec!["a"]);
        assert!(!store.is_bookmarked("b"));
    }

    #[tokio::test]
    async fn test_load_failure_yields_empty_set() {
        let db = Database::open(":memory:").await.unwrap();
        db.close().await;
        let store = BookmarkStore::load(db).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_value_yields_empty_set() {
        let db = Database::open(":memory:").await.unwrap();
        db.set(keys::BOOKMARKS, "not json").await.unwrap();
        let store = BookmarkStore::load(db).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_drops_duplicate_ids() {
        let db = Database::open(":memory:").await.unwrap();
        db.set_json(keys::BOOKMARKS, &vec![article("a"), article("b"), article("a")])
            .await
            .unwrap();
        let store = BookmarkStore::load(db).await;
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u8..6).prop_map(Op::Add), (0u8..6).prop_map(Op::Remove)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Any add/remove sequence leaves no duplicate ids, matches a simple
        /// newest-first model and survives a reload unchanged.
        #[test]
        fn prop_bookmarks_match_model(ops in prop::collection::vec(op(), 0..30)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let (store_ids, reloaded_ids, model) = rt.block_on(async {
                let (db, mut store) = fresh().await;
                let mut model: Vec<String> = Vec::new();

                for op in &ops {
                    match op {
                        Op::Add(n) => {
                            let id = format!("id{n}");
                            store.add(article(&id)).await.unwrap();
                            if !model.contains(&id) {
                                model.insert(0, id);
                            }
                        }
                        Op::Remove(n) => {
                            let id = format!("id{n}");
                            store.remove(&id).await.unwrap();
                            model.retain(|m| m != &id);
                        }
                    }
                }

                let store_ids: Vec<String> = store.list().iter().map(|a| a.id.clone()).collect();
                let reloaded = BookmarkStore::load(db).await;
                let reloaded_ids: Vec<String> =
                    reloaded.list().iter().map(|a| a.id.clone()).collect();
                (store_ids, reloaded_ids, model)
            });

            prop_assert_eq!(&store_ids, &model);
            prop_assert_eq!(&reloaded_ids, &model);
        }
    }
}
