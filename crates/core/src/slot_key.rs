//! Advisory lock keys.

use sha2::{Digest, Sha256};

use crate::types::{DbId, Timestamp};

/// Advisory lock serializing break-rule expansion across processes.
pub const BREAK_EXPANSION_LOCK_ID: i64 = 736_451_902;

/// Lock key for a reservation starting at `start` for `service_id`.
///
/// The first eight bytes of `SHA-256("{unix_seconds}:{service_id}")`, read
/// big-endian and masked to 63 bits so the value is a non-negative `BIGINT`.
/// Distinct slots may share a key; that only adds contention.
pub fn slot_lock_key(start: Timestamp, service_id: DbId) -> i64 {
    let digest = Sha256::digest(format!("{}:{}", start.timestamp(), service_id).as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) & (u64::MAX >> 1)) as i64
}
