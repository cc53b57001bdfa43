//! Redis-backed shared store
//!
//! Binds the [`SharedStore`] contract to single Redis commands: LPUSH,
//! LMOVE, LREM, LLEN, HSET/HGET/HDEL, and MULTI/EXEC pipelines for the
//! snapshot and reload paths. Redis executes each command atomically, which
//! is the entire synchronization story for the pool — safe across threads
//! and across processes pointed at the same instance.

use redis::{AsyncCommands, Direction, aio::ConnectionManager};

use crate::error::{Error, Result};
use crate::store::{AtomicReload, SharedStore, StoreFuture};

fn conn_err(e: redis::RedisError) -> Error {
    Error::Connectivity(e.to_string())
}

/// [`SharedStore`] over a multiplexed Redis connection.
///
/// `ConnectionManager` reconnects on its own; a command issued while the
/// connection is down still fails, and that failure surfaces as
/// `Error::Connectivity` rather than being retried here.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and verify reachability with a PING, so an unreachable store
    /// fails at startup instead of on the first lease.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(conn_err)?;
        let mut conn = client.get_connection_manager().await.map_err(conn_err)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(conn_err)?;
        Ok(Self { conn })
    }
}

impl SharedStore for RedisStore {
    fn push_front<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.lpush(list, value).await.map_err(conn_err)?;
            Ok(())
        })
    }

    fn move_back_to_front<'a>(
        &'a self,
        src: &'a str,
        dst: &'a str,
    ) -> StoreFuture<'a, Option<String>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let moved: Option<String> = conn
                .lmove(src, dst, Direction::Right, Direction::Left)
                .await
                .map_err(conn_err)?;
            Ok(moved)
        })
    }

    fn remove_one<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, u64> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let removed: i64 = conn.lrem(list, 1, value).await.map_err(conn_err)?;
            Ok(removed.max(0) as u64)
        })
    }

    fn list_entries<'a>(&'a self, list: &'a str) -> StoreFuture<'a, Vec<String>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let entries: Vec<String> = conn.lrange(list, 0, -1).await.map_err(conn_err)?;
            Ok(entries)
        })
    }

    fn list_len<'a>(&'a self, list: &'a str) -> StoreFuture<'a, i64> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let len: i64 = conn.llen(list).await.map_err(conn_err)?;
            Ok(len)
        })
    }

    fn list_lens<'a>(&'a self, lists: &'a [&'a str]) -> StoreFuture<'a, Vec<i64>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let mut pipe = redis::pipe();
            pipe.atomic();
            for list in lists {
                pipe.llen(*list);
            }
            let lens: Vec<i64> = pipe.query_async(&mut conn).await.map_err(conn_err)?;
            Ok(lens)
        })
    }

    fn hash_set<'a>(
        &'a self,
        map: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> StoreFuture<'a, ()> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.hset(map, field, value).await.map_err(conn_err)?;
            Ok(())
        })
    }

    fn hash_get<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let value: Option<String> = conn.hget(map, field).await.map_err(conn_err)?;
            Ok(value)
        })
    }

    fn hash_delete<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, ()> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.hdel(map, field).await.map_err(conn_err)?;
            Ok(())
        })
    }

    fn hash_entries<'a>(&'a self, map: &'a str) -> StoreFuture<'a, Vec<(String, String)>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let entries: std::collections::HashMap<String, String> =
                conn.hgetall(map).await.map_err(conn_err)?;
            Ok(entries.into_iter().collect())
        })
    }

    fn replace_all<'a>(&'a self, batch: AtomicReload) -> StoreFuture<'a, ()> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let mut pipe = redis::pipe();
            pipe.atomic();
            if !batch.delete.is_empty() {
                pipe.del(&batch.delete).ignore();
            }
            let (queue, values) = &batch.push_front;
            if !values.is_empty() {
                // Multi-value LPUSH head-inserts left to right, matching
                // sequential push_front calls.
                pipe.lpush(queue, values).ignore();
            }
            let (map, fields) = &batch.hash_fill;
            if !fields.is_empty() {
                pipe.hset_multiple(map, fields).ignore();
            }
            let _: () = pipe.query_async(&mut conn).await.map_err(conn_err)?;
            Ok(())
        })
    }
}
