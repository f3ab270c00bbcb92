//! Error taxonomy for reads against the external spreadsheet.
//!
//! Nothing in this taxonomy is fatal to the process: the observer loop
//! retries `SourceUnavailable` and `EmptySource` with backoff while the hub
//! keeps serving its last known snapshot. Malformed rows are skipped and
//! logged inside the parser and never surface as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    /// The spreadsheet endpoint could not be reached, timed out, returned a
    /// non-success status, or produced an undecodable body. Transient.
    #[error("sheet source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),

    /// The sheet returned zero parseable rows. Treated as transient (e.g. a
    /// human mid-edit); an already-populated board is never wiped by it.
    #[error("sheet returned no parseable rows")]
    EmptySource,
}
