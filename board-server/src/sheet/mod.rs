//! Snapshot Reader
//!
//! Pulls the full current state of the assignment spreadsheet and
//! normalizes it into the canonical data model. The external source sits
//! behind the [`SheetSource`] port so the observer pipeline can be driven
//! by the HTTP values endpoint in production and by an in-memory fake in
//! tests.

mod http;
mod parser;

pub use http::HttpSheetSource;
pub use parser::parse_rows;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ReadError;
use crate::models::Snapshot;

/// Port for reading the raw spreadsheet grid.
///
/// A row is a list of cell strings; the parser expects
/// `(room_id, field, value)` data rows.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ReadError>;
}

/// Reads the sheet on demand and produces versioned snapshots.
///
/// Versions come from an internal counter and only advance on a successful
/// read, so they increase monotonically. The reader is owned by a single
/// polling loop and never called concurrently with itself.
pub struct SnapshotReader<S> {
    source: S,
    version: u64,
}

impl<S: SheetSource> SnapshotReader<S> {
    pub fn new(source: S) -> Self {
        Self { source, version: 0 }
    }

    /// Fetch and parse the sheet into a new snapshot.
    ///
    /// Malformed rows are skipped (and logged) rather than failing the
    /// read; a read with zero parseable rows fails with
    /// [`ReadError::EmptySource`].
    pub async fn read(&mut self) -> Result<Snapshot, ReadError> {
        let rows = self.source.fetch_rows().await?;
        let entries = parser::parse_rows(&rows)?;

        self.version += 1;
        let snapshot = Snapshot {
            version: self.version,
            captured_at: Utc::now(),
            entries,
        };
        tracing::info!(
            version = snapshot.version,
            rooms = snapshot.entries.len(),
            "sheet snapshot captured"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<Vec<String>>);

    #[async_trait]
    impl SheetSource for FixedSource {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ReadError> {
            Ok(self.0.clone())
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn versions_increase_per_successful_read() {
        let mut reader = SnapshotReader::new(FixedSource(vec![row(&[
            "101", "course", "Math",
        ])]));
        let first = reader.read().await.unwrap();
        let second = reader.read().await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(first.entries, second.entries);
    }

    #[tokio::test]
    async fn failed_read_does_not_consume_a_version() {
        struct FlakySource(std::sync::atomic::AtomicBool);

        #[async_trait]
        impl SheetSource for FlakySource {
            async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ReadError> {
                if self.0.swap(false, std::sync::atomic::Ordering::SeqCst) {
                    Ok(vec![])
                } else {
                    Ok(vec![vec![
                        "101".to_string(),
                        "course".to_string(),
                        "Math".to_string(),
                    ]])
                }
            }
        }

        let mut reader = SnapshotReader::new(FlakySource(std::sync::atomic::AtomicBool::new(
            true,
        )));
        assert!(matches!(reader.read().await, Err(ReadError::EmptySource)));
        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.version, 1);
    }
}
