// src/counter_store.rs
//! Persisted integer counters, keyed by name.
//!
//! The hue counter survives between highlighting runs here. `update_counter`
//! holds the store (mutex guard or sqlite write lock) from read to write, so
//! concurrent updates of one key never lose each other's changes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::color::ColorCounter;
use crate::error::StoreError;

pub trait CounterStore {
    fn get_counter(&self, key: &str) -> Result<Option<i64>, StoreError>;
    fn set_counter(&self, key: &str, value: i64) -> Result<(), StoreError>;

    /// Read, transform and write one counter as a single atomic step.
    /// Returns the value written.
    fn update_counter(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<i64>) -> i64,
    ) -> Result<i64, StoreError>;
}

/// Atomically advance a color counter. An absent counter starts at hue 0.
pub fn update_color_counter<S, F>(store: &S, key: &str, f: F) -> Result<ColorCounter, StoreError>
where
    S: CounterStore + ?Sized,
    F: FnOnce(ColorCounter) -> ColorCounter,
{
    let mut f = Some(f);
    let written = store.update_counter(key, &mut |current| {
        let counter = current.map(ColorCounter::new).unwrap_or_default();
        match f.take() {
            Some(f) => f(counter).hue(),
            None => counter.hue(),
        }
    })?;
    Ok(ColorCounter::new(written))
}

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn get_counter(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let counters = self
            .counters
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(counters.get(key).copied())
    }

    fn set_counter(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        counters.insert(key.to_string(), value);
        Ok(())
    }

    fn update_counter(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<i64>) -> i64,
    ) -> Result<i64, StoreError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let next = f(counters.get(key).copied());
        counters.insert(key.to_string(), next);
        Ok(next)
    }
}

pub struct SqliteCounterStore {
    conn: Connection,
}

impl SqliteCounterStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                key         TEXT PRIMARY KEY,
                value       INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Last write time of a counter, in Unix milliseconds
    pub fn updated_at(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM counters WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

impl CounterStore for SqliteCounterStore {
    fn get_counter(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM counters WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_counter(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            r#"
            INSERT INTO counters (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    fn update_counter(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<i64>) -> i64,
    ) -> Result<i64, StoreError> {
        // Take the write lock up front so no other connection reads in between
        self.conn.execute_batch("BEGIN IMMEDIATE")?;

        let result = self.get_counter(key).and_then(|current| {
            let next = f(current);
            self.set_counter(key, next)?;
            Ok(next)
        });

        match result {
            Ok(next) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(next)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").ok();
                Err(err)
            }
        }
    }
}
