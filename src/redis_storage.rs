use crate::error::{FilterError, Result};
use crate::storage::BitStorage;
use redis::{Client, Connection};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Bit storage kept in a single Redis bitmap.
///
/// Positions are not bounds-checked: the bitmap grows on demand, and the
/// filter already reduces every position modulo its size.
///
/// `set_bits` does not refresh an expiry. Once the key has expired, a write
/// recreates it without one, so the expiry must outlast the generation.
pub struct RedisStorage {
    conn: Mutex<Connection>,
    key: String,
    capacity: usize,
}

impl RedisStorage {
    /// Opens a connection and claims a fresh bitmap named
    /// `{key}_{unix_nanos}`, so every filter generation gets its own key.
    pub fn new(client: &Client, key: &str, capacity: usize) -> Result<Self> {
        let conn = client.get_connection()?;
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| FilterError::StorageError(e.to_string()))?
            .as_nanos();
        let storage = Self::with_connection(
            conn,
            format!("{key}_{nanos}"),
            capacity,
        );
        // Materialise the key so an expiry can be attached right away.
        storage.touch()?;
        debug!(key = %storage.key, capacity, "redis bitmap created");
        Ok(storage)
    }

    /// Uses `key` exactly as given.
    pub fn with_connection(conn: Connection, key: String, capacity: usize) -> Self {
        Self {
            conn: Mutex::new(conn),
            key,
            capacity,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&self) -> Result<()> {
        let mut conn = self.lock()?;
        redis::cmd("SETBIT")
            .arg(&self.key)
            .arg(0)
            .arg(0)
            .query::<()>(&mut *conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FilterError::StorageError(format!("Redis lock error: {}", e))
        })
    }
}

impl BitStorage for RedisStorage {
    fn set_bits(&self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for &index in indices {
            pipe.cmd("SETBIT").arg(&self.key).arg(index).arg(1).ignore();
        }

        let mut conn = self.lock()?;
        pipe.query::<()>(&mut *conn)?;
        Ok(())
    }

    fn check_bits(&self, indices: &[usize]) -> Result<bool> {
        if indices.is_empty() {
            return Ok(true);
        }

        let mut pipe = redis::pipe();
        for &index in indices {
            pipe.cmd("GETBIT").arg(&self.key).arg(index);
        }

        let mut conn = self.lock()?;
        let bits: Vec<i64> = pipe.query(&mut *conn)?;
        Ok(bits.iter().all(|&bit| bit == 1))
    }

    fn set_expire_ttl(&self, ttl: Duration) -> Result<()> {
        let mut conn = self.lock()?;
        redis::cmd("PEXPIRE")
            .arg(&self.key)
            .arg(ttl.as_millis() as u64)
            .query::<()>(&mut *conn)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RedisStorage {{ key: {}, capacity: {} }}",
            self.key, self.capacity
        )
    }
}
