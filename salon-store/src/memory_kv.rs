use salon_core::{CoreError, CoreResult, KeyValueStore};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local key-value store
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("cart").unwrap(), None);

        kv.set("cart", "[]").unwrap();
        assert_eq!(kv.get("cart").unwrap().as_deref(), Some("[]"));

        kv.set("cart", "[1]").unwrap();
        assert_eq!(kv.get("cart").unwrap().as_deref(), Some("[1]"));

        kv.remove("cart").unwrap();
        assert_eq!(kv.get("cart").unwrap(), None);
    }
}
