//! Canonical data model for the assignment board
//!
//! A `Snapshot` is the full board state at one version, keyed by room id.
//! A `DiffBatch` is the unit pushed to viewers: the ordered set of changes
//! between two snapshot versions, or a synthetic full-state batch
//! (`base_version = None`) used to bootstrap a freshly connected viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classroom's current occupant/session info.
///
/// `fields` maps attribute names (course, instructor, time block, ...) to
/// values. `BTreeMap` keeps serialization order deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub room_id: String,
    pub fields: BTreeMap<String, String>,
}

/// The full board state at one point in time.
///
/// Immutable once constructed; superseded (never mutated) by the next
/// snapshot. `version` is assigned by the snapshot reader at capture time
/// and increases monotonically. Entries are keyed by `room_id`, which is
/// unique within a snapshot by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub entries: BTreeMap<String, AssignmentEntry>,
}

/// Kind of change for a single room between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// One atomic difference between two snapshots for a single room.
///
/// `fields` carries the new field map for `Added`/`Updated` and is absent
/// for `Removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

/// The unit pushed to viewers over the wire.
///
/// `base_version = None` marks a bootstrap batch (full state rendered as
/// `Added` records). Changes are ordered by ascending `room_id` so that
/// repeated diffs of identical input are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBatch {
    pub base_version: Option<u64>,
    pub new_version: u64,
    pub changes: Vec<ChangeRecord>,
}

impl AssignmentEntry {
    /// Convenience constructor used throughout tests and the parser.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChangeKind::Added).unwrap(), "\"added\"");
        assert_eq!(
            serde_json::to_string(&ChangeKind::Removed).unwrap(),
            "\"removed\""
        );
    }

    #[test]
    fn removed_record_omits_fields() {
        let record = ChangeRecord {
            kind: ChangeKind::Removed,
            room_id: "101".to_string(),
            fields: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("fields"));
        assert_eq!(json, r#"{"kind":"removed","room_id":"101"}"#);
    }

    #[test]
    fn bootstrap_batch_wire_shape() {
        let batch = DiffBatch {
            base_version: None,
            new_version: 1,
            changes: vec![ChangeRecord {
                kind: ChangeKind::Added,
                room_id: "101".to_string(),
                fields: Some(
                    AssignmentEntry::new("101")
                        .with_field("course", "Math")
                        .fields,
                ),
            }],
        };
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.starts_with(r#"{"base_version":null,"new_version":1"#));
        assert!(json.contains(r#""course":"Math""#));
    }
}
