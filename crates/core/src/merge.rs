#![allow(missing_docs)]

//! Change-set merge between a fresh pass and the previous snapshot.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, warn};

use crate::models::GameRecord;

/// Per-category counts from a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Merged snapshot and whether it differs from the previous one.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub snapshot: Vec<GameRecord>,
    pub changed: bool,
    pub stats: MergeStats,
}

/// Canonical form used for equality.
///
/// `serde_json` objects keep their keys sorted, so the comparison does not
/// depend on field order; list order (e.g. genres) stays significant.
pub fn canonical(record: &GameRecord) -> serde_json::Result<Value> {
    serde_json::to_value(record)
}

/// Records that cannot be put in canonical form never compare equal.
fn same_content(old: &GameRecord, new: &GameRecord) -> bool {
    match (canonical(old), canonical(new)) {
        (Ok(old), Ok(new)) => old == new,
        (Err(err), _) | (_, Err(err)) => {
            warn!("failed to compare {}: {err}", new.id);
            false
        }
    }
}

/// Merge `new_records` against `previous`.
///
/// Unchanged records are taken from `previous` so their persisted form is
/// preserved. Output order follows `new_records`.
pub fn merge(new_records: Vec<GameRecord>, previous: &[GameRecord]) -> MergeResult {
    let mut previous_by_id: HashMap<&str, &GameRecord> = HashMap::with_capacity(previous.len());
    for record in previous {
        previous_by_id.entry(record.id.as_str()).or_insert(record);
    }

    let mut stats = MergeStats::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(new_records.len());
    let mut snapshot = Vec::with_capacity(new_records.len());

    for record in new_records {
        if !seen.insert(record.id.clone()) {
            warn!("duplicate id {} ({}) in export pass, keeping first", record.id, record.name);
            continue;
        }

        match previous_by_id.get(record.id.as_str()) {
            None => {
                info!("Adding new game: {}", record.name);
                stats.added += 1;
                snapshot.push(record);
            }
            Some(old) if !same_content(old, &record) => {
                info!("Updating game: {}", record.name);
                stats.updated += 1;
                snapshot.push(record);
            }
            Some(old) => {
                stats.unchanged += 1;
                snapshot.push((*old).clone());
            }
        }
    }

    stats.removed = previous_by_id
        .keys()
        .filter(|id| !seen.contains(**id))
        .count();
    if stats.removed > 0 {
        info!("Removing {} games no longer in the library", stats.removed);
    }

    let changed = stats.added > 0 || stats.updated > 0 || stats.removed > 0;
    MergeResult {
        snapshot,
        changed,
        stats,
    }
}
