//! Round-robin sharding of the identity list across shard groups.

use crate::types::{ConfigError, Identity};

/// Split `identities` into `process_count` shards, round robin by index:
/// identity `i` lands in shard `i % process_count`. Every identity appears in
/// exactly one shard and shard sizes differ by at most one; per-identity cost
/// is unknown up front, so this is as even as it gets.
///
/// Shards past the identity count come back empty (the orchestrator spawns no
/// group for them). Fails on an empty list or a zero process count.
pub fn partition(
    identities: Vec<Identity>,
    process_count: usize,
) -> Result<Vec<Vec<Identity>>, ConfigError> {
    if process_count == 0 {
        return Err(ConfigError::NoProcesses);
    }
    if identities.is_empty() {
        return Err(ConfigError::NoIdentities);
    }
    let mut shards: Vec<Vec<Identity>> = vec![Vec::new(); process_count];
    for (i, identity) in identities.into_iter().enumerate() {
        shards[i % process_count].push(identity);
    }
    Ok(shards)
}

/// Clamp the configured worker count to the shard size; idle workers on a
/// short shard buy nothing.
pub fn effective_threads(configured: usize, shard_len: usize) -> usize {
    configured.min(shard_len)
}
