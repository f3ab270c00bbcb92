//! Row parser for the assignment sheet.
//!
//! Data rows are `(room_id, field, value)` triples; successive rows for
//! the same room accumulate into one entry. The sheet is edited by humans,
//! so partial rows are expected: they are skipped and logged, never fatal.

use std::collections::BTreeMap;

use crate::error::ReadError;
use crate::models::AssignmentEntry;

/// Normalize a raw sheet grid into assignment entries keyed by room id.
///
/// Returns [`ReadError::EmptySource`] when no row parses at all, so a
/// sheet caught mid-edit cannot wipe an already-populated board.
pub fn parse_rows(rows: &[Vec<String>]) -> Result<BTreeMap<String, AssignmentEntry>, ReadError> {
    let mut entries: BTreeMap<String, AssignmentEntry> = BTreeMap::new();
    let mut skipped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        if index == 0 && is_header(row) {
            continue;
        }
        match parse_row(row) {
            Some((room_id, field, value)) => {
                let entry = entries
                    .entry(room_id.clone())
                    .or_insert_with(|| AssignmentEntry::new(room_id.clone()));
                entry.fields.insert(field, value);
            }
            None => {
                skipped += 1;
                tracing::warn!(row = index + 1, cells = row.len(), "skipping malformed sheet row");
            }
        }
    }

    if entries.is_empty() {
        return Err(ReadError::EmptySource);
    }
    if skipped > 0 {
        tracing::warn!(skipped, parsed = entries.len(), "sheet read finished with skipped rows");
    }
    Ok(entries)
}

/// A data row needs a room id, a field name, and a value cell (the value
/// itself may be blank, e.g. a cleared course cell).
fn parse_row(row: &[String]) -> Option<(String, String, String)> {
    if row.len() < 3 {
        return None;
    }
    let room_id = row[0].trim();
    let field = row[1].trim();
    if room_id.is_empty() || field.is_empty() {
        return None;
    }
    Some((
        room_id.to_string(),
        field.to_string(),
        row[2].trim().to_string(),
    ))
}

fn is_header(row: &[String]) -> bool {
    row.first()
        .map(|c| {
            let cell = c.trim().to_ascii_lowercase();
            cell == "room_id" || cell == "room" || cell == "aula"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn accumulates_fields_per_room() {
        let rows = vec![
            row(&["101", "course", "Math"]),
            row(&["101", "instructor", "Rivera"]),
            row(&["102", "course", "Art"]),
        ];
        let entries = parse_rows(&rows).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["101"].fields["course"], "Math");
        assert_eq!(entries["101"].fields["instructor"], "Rivera");
        assert_eq!(entries["102"].fields["course"], "Art");
    }

    #[test]
    fn skips_malformed_rows_without_failing() {
        let rows = vec![
            row(&["101", "course", "Math"]),
            row(&["", "course", "Ghost"]),    // no room id
            row(&["103", "", "Orphan"]),      // no field name
            row(&["104"]),                    // too short
            row(&["105", "course", "Bio"]),
        ];
        let entries = parse_rows(&rows).unwrap();
        let rooms: Vec<&String> = entries.keys().collect();
        assert_eq!(rooms, vec!["101", "105"]);
    }

    #[test]
    fn tolerates_leading_header_row() {
        let rows = vec![
            row(&["room_id", "field", "value"]),
            row(&["101", "course", "Math"]),
        ];
        let entries = parse_rows(&rows).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("101"));
    }

    #[test]
    fn empty_value_cell_is_kept() {
        let rows = vec![row(&["101", "course", ""])];
        let entries = parse_rows(&rows).unwrap();
        assert_eq!(entries["101"].fields["course"], "");
    }

    #[test]
    fn zero_parseable_rows_is_empty_source() {
        assert!(matches!(parse_rows(&[]), Err(ReadError::EmptySource)));
        let only_junk = vec![row(&["104"]), row(&["", "course", "x"])];
        assert!(matches!(
            parse_rows(&only_junk),
            Err(ReadError::EmptySource)
        ));
    }
}
