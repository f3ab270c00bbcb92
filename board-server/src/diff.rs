//! Diff Engine
//!
//! Compares a newly read snapshot against the last known snapshot and
//! produces an ordered set of change records. Pure and deterministic: the
//! same pair of snapshots always yields the same batch, in the same order
//! (ascending `room_id`).

use std::collections::BTreeMap;

use crate::models::{AssignmentEntry, ChangeKind, ChangeRecord, DiffBatch, Snapshot};

/// Compute the change set between `previous` and `current`.
///
/// With `previous = None` (first read ever, or a viewer bootstrap) every
/// entry in `current` becomes an `Added` record and `base_version` is
/// `None`. Neither input is mutated.
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> DiffBatch {
    let mut changes = Vec::new();

    match previous {
        None => {
            for entry in current.entries.values() {
                changes.push(ChangeRecord {
                    kind: ChangeKind::Added,
                    room_id: entry.room_id.clone(),
                    fields: Some(entry.fields.clone()),
                });
            }
        }
        Some(prev) => {
            for (room_id, entry) in &current.entries {
                match prev.entries.get(room_id) {
                    None => changes.push(ChangeRecord {
                        kind: ChangeKind::Added,
                        room_id: room_id.clone(),
                        fields: Some(entry.fields.clone()),
                    }),
                    Some(old) if old.fields != entry.fields => changes.push(ChangeRecord {
                        kind: ChangeKind::Updated,
                        room_id: room_id.clone(),
                        fields: Some(entry.fields.clone()),
                    }),
                    Some(_) => {}
                }
            }
            for room_id in prev.entries.keys() {
                if !current.entries.contains_key(room_id) {
                    changes.push(ChangeRecord {
                        kind: ChangeKind::Removed,
                        room_id: room_id.clone(),
                        fields: None,
                    });
                }
            }
        }
    }

    // BTreeMap iteration already yields each kind in ascending room_id
    // order; one stable sort interleaves removals with adds/updates.
    changes.sort_by(|a, b| a.room_id.cmp(&b.room_id));

    DiffBatch {
        base_version: previous.map(|p| p.version),
        new_version: current.version,
        changes,
    }
}

/// Apply a change list to an entry map (add/update/remove by `room_id`).
///
/// Used by the hub to advance its held snapshot and by tests to verify the
/// completeness property: applying `diff(A, B)` to `A`'s entries yields
/// exactly `B`'s entries.
pub fn apply(entries: &mut BTreeMap<String, AssignmentEntry>, changes: &[ChangeRecord]) {
    for change in changes {
        match change.kind {
            ChangeKind::Added | ChangeKind::Updated => {
                entries.insert(
                    change.room_id.clone(),
                    AssignmentEntry {
                        room_id: change.room_id.clone(),
                        fields: change.fields.clone().unwrap_or_default(),
                    },
                );
            }
            ChangeKind::Removed => {
                entries.remove(&change.room_id);
            }
        }
    }
}
