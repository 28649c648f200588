use crate::CoreResult;

/// Synchronous string-keyed store with no expiry of its own.
///
/// Implementations may fail on any call; the checkout store treats every
/// failure as best effort and never surfaces it.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    fn remove(&self, key: &str) -> CoreResult<()>;
}
