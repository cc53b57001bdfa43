//! In-process store for tests and single-node deployments
//!
//! Implements the [`SharedStore`] contract over a single mutex: every
//! operation takes the lock once and never awaits while holding it, so each
//! call is atomic exactly the way a Redis command is. Useless across
//! processes, which is the point of the real store.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::store::{AtomicReload, SharedStore, StoreFuture};

#[derive(Default)]
struct Inner {
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// Mutex-backed [`SharedStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a holder panicked; the data is
        // plain collections, safe to keep using.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SharedStore for MemoryStore {
    fn push_front<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.lock()
                .lists
                .entry(list.to_string())
                .or_default()
                .push_front(value.to_string());
            Ok(())
        })
    }

    fn move_back_to_front<'a>(
        &'a self,
        src: &'a str,
        dst: &'a str,
    ) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut inner = self.lock();
            let moved = inner.lists.get_mut(src).and_then(|l| l.pop_back());
            if let Some(ref value) = moved {
                inner
                    .lists
                    .entry(dst.to_string())
                    .or_default()
                    .push_front(value.clone());
            }
            Ok(moved)
        })
    }

    fn remove_one<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            let mut inner = self.lock();
            let Some(entries) = inner.lists.get_mut(list) else {
                return Ok(0);
            };
            match entries.iter().position(|v| v == value) {
                Some(idx) => {
                    entries.remove(idx);
                    Ok(1)
                }
                None => Ok(0),
            }
        })
    }

    fn list_entries<'a>(&'a self, list: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .lists
                .get(list)
                .map(|l| l.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn list_len<'a>(&'a self, list: &'a str) -> StoreFuture<'a, i64> {
        Box::pin(async move { Ok(self.lock().lists.get(list).map_or(0, |l| l.len() as i64)) })
    }

    fn list_lens<'a>(&'a self, lists: &'a [&'a str]) -> StoreFuture<'a, Vec<i64>> {
        Box::pin(async move {
            let inner = self.lock();
            Ok(lists
                .iter()
                .map(|list| inner.lists.get(*list).map_or(0, |l| l.len() as i64))
                .collect())
        })
    }

    fn hash_set<'a>(
        &'a self,
        map: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.lock()
                .hashes
                .entry(map.to_string())
                .or_default()
                .insert(field.to_string(), value.to_string());
            Ok(())
        })
    }

    fn hash_get<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .hashes
                .get(map)
                .and_then(|h| h.get(field).cloned()))
        })
    }

    fn hash_delete<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if let Some(h) = self.lock().hashes.get_mut(map) {
                h.remove(field);
            }
            Ok(())
        })
    }

    fn hash_entries<'a>(&'a self, map: &'a str) -> StoreFuture<'a, Vec<(String, String)>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .hashes
                .get(map)
                .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default())
        })
    }

    fn replace_all<'a>(&'a self, batch: AtomicReload) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut inner = self.lock();
            for name in &batch.delete {
                inner.lists.remove(name);
                inner.hashes.remove(name);
            }
            let (queue, values) = batch.push_front;
            if !values.is_empty() {
                let entries = inner.lists.entry(queue).or_default();
                for value in values {
                    entries.push_front(value);
                }
            }
            let (map, fields) = batch.hash_fill;
            if !fields.is_empty() {
                inner.hashes.entry(map).or_default().extend(fields);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_move_is_fifo() {
        let store = MemoryStore::new();
        store.push_front("q", "a").await.unwrap();
        store.push_front("q", "b").await.unwrap();

        // "a" went in first, so it comes out first from the tail.
        let moved = store.move_back_to_front("q", "busy").await.unwrap();
        assert_eq!(moved.as_deref(), Some("a"));
        assert_eq!(store.list_len("q").await.unwrap(), 1);
        assert_eq!(store.list_len("busy").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn move_from_empty_list_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.move_back_to_front("q", "busy").await.unwrap(), None);
        assert_eq!(store.list_len("busy").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_one_removes_single_occurrence() {
        let store = MemoryStore::new();
        store.push_front("q", "a").await.unwrap();
        store.push_front("q", "a").await.unwrap();

        assert_eq!(store.remove_one("q", "a").await.unwrap(), 1);
        assert_eq!(store.list_len("q").await.unwrap(), 1);
        assert_eq!(store.remove_one("q", "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn hash_set_get_delete() {
        let store = MemoryStore::new();
        store.hash_set("m", "k", "v").await.unwrap();
        assert_eq!(store.hash_get("m", "k").await.unwrap().as_deref(), Some("v"));

        store.hash_delete("m", "k").await.unwrap();
        assert_eq!(store.hash_get("m", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_all_clears_and_refills() {
        let store = MemoryStore::new();
        store.push_front("old", "x").await.unwrap();
        store.hash_set("meta", "x", "full").await.unwrap();

        store
            .replace_all(AtomicReload {
                delete: vec!["old".into(), "meta".into()],
                push_front: ("new".into(), vec!["a".into(), "b".into()]),
                hash_fill: ("meta".into(), vec![("a".into(), "full".into())]),
            })
            .await
            .unwrap();

        assert_eq!(store.list_len("old").await.unwrap(), 0);
        assert_eq!(store.list_len("new").await.unwrap(), 2);
        assert_eq!(store.hash_get("meta", "x").await.unwrap(), None);
        assert_eq!(
            store.hash_get("meta", "a").await.unwrap().as_deref(),
            Some("full")
        );
        // Head-insert in order: "a" first in means "a" first out at the tail.
        let first = store.move_back_to_front("new", "busy").await.unwrap();
        assert_eq!(first.as_deref(), Some("a"));
    }
}
