pub mod app_config;
pub mod backend_client;
pub mod memory_kv;
pub mod redis_repo;

pub use backend_client::{BackendHttpError, HttpReservationBackend};
pub use memory_kv::MemoryKv;
pub use redis_repo::RedisKv;
