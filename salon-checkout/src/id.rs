//! Pending reservation ids: `pending_<epoch-millis>_<suffix>`.
//!
//! The creation time lives inside the id and drives the expiry sweep.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const ID_PREFIX: &str = "pending";

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate(now: DateTime<Utc>) -> String {
    format!("{}_{}_{}", ID_PREFIX, now.timestamp_millis(), random_suffix())
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Creation time embedded in the second `_` segment, `None` when unparsable
pub fn created_at(id: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = id.split('_').nth(1)?.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}
