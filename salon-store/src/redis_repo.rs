use redis::Commands;
use salon_core::{CoreError, CoreResult, KeyValueStore};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Redis-backed key-value store.
///
/// Uses the blocking client because `KeyValueStore` is synchronous. One
/// connection is opened lazily and reused; it is dropped after any error and
/// reopened on the next call.
pub struct RedisKv {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisKv {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> CoreResult<T> {
        let mut slot = self.slot();
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.client.get_connection().map_err(storage_error)?,
        };

        match op(&mut conn) {
            Ok(value) => {
                *slot = Some(conn);
                Ok(value)
            }
            Err(e) => {
                warn!("Dropping redis connection after error: {}", e);
                Err(storage_error(e))
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<redis::Connection>> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_connected(&self) -> bool {
        self.slot().is_some()
    }
}

impl std::fmt::Debug for RedisKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKv").finish_non_exhaustive()
    }
}

fn storage_error(err: redis::RedisError) -> CoreError {
    CoreError::Storage(err.to_string())
}

impl KeyValueStore for RedisKv {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.with_connection(|conn| conn.get(key))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.with_connection(|conn| conn.set::<_, _, ()>(key, value))?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.with_connection(|conn| conn.del::<_, ()>(key))
    }
}
