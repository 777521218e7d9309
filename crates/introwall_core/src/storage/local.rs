//! SQLite-backed key-value storage.

use crate::db::DbError;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from local storage reads and writes.
#[derive(Debug)]
pub enum StorageError {
    /// Key is blank.
    InvalidKey,
    /// Underlying SQLite failure.
    Db(DbError),
    /// Value could not be encoded to or decoded from JSON.
    Json(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "storage key must not be blank"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid stored json: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey => None,
            Self::Db(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// String key-value store over the `local_storage` table.
///
/// Borrows a migrated connection, the same way repositories do.
#[derive(Clone, Copy)]
pub struct LocalStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LocalStorage<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the raw value stored for `key`, if any.
    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO local_storage (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        debug!(
            "event=storage_write module=storage status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }

    /// Deletes `key`. Missing keys are not an error.
    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        let key = normalize_key(key)?;
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1;", [key])?;
        Ok(())
    }

    /// Lists keys starting with `prefix`, sorted ascending.
    pub fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM local_storage
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key ASC;",
        )?;
        let mut rows = stmt.query([prefix])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }

    /// Removes every stored entry.
    pub fn clear(&self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM local_storage;", [])?;
        Ok(())
    }

    /// Reads and decodes a JSON value stored under `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` as JSON and stores it under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }
}

fn normalize_key(key: &str) -> StorageResult<&str> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey);
    }
    Ok(key)
}
