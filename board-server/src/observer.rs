//! Sheet observer loop
//!
//! The single polling loop that drives the pipeline: read a snapshot,
//! diff it against the last one, and hand any change to the broadcast
//! hub. Read failures never reach the hub; the board simply stays on its
//! last known state while the loop backs off and retries.

use std::sync::Arc;
use std::time::Duration;

use crate::config::PollConfig;
use crate::diff;
use crate::error::ReadError;
use crate::hub::BroadcastHub;
use crate::models::Snapshot;
use crate::sheet::{SheetSource, SnapshotReader};

pub struct SheetObserver<S> {
    reader: SnapshotReader<S>,
    hub: Arc<BroadcastHub>,
    poll: PollConfig,
    last: Option<Snapshot>,
}

impl<S: SheetSource> SheetObserver<S> {
    pub fn new(reader: SnapshotReader<S>, hub: Arc<BroadcastHub>, poll: PollConfig) -> Self {
        Self {
            reader,
            hub,
            poll,
            last: None,
        }
    }

    /// Run the observation loop forever.
    ///
    /// Successful cycles run on the configured interval; after a failure
    /// the loop sleeps for an exponential backoff instead. Crossing
    /// `max_retries` consecutive failures only escalates the log level,
    /// nothing here is fatal.
    pub async fn run(mut self) {
        tracing::info!(
            interval = self.poll.interval_seconds,
            "starting sheet observation loop"
        );

        let mut consecutive_errors: u32 = 0;
        let mut interval = tokio::time::interval(Duration::from_secs(self.poll.interval_seconds));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.run_cycle().await {
                Ok(()) => consecutive_errors = 0,
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = consecutive_errors,
                        "observation cycle failed, board keeps last known state"
                    );
                    if consecutive_errors >= self.poll.max_retries {
                        tracing::error!(
                            consecutive_errors,
                            "sheet source is persistently failing"
                        );
                    }
                    tokio::time::sleep(backoff_delay(&self.poll, consecutive_errors)).await;
                }
            }
        }
    }

    /// One observation cycle: read, diff, ingest. Exposed so tests can
    /// drive the pipeline without timers.
    pub async fn run_cycle(&mut self) -> Result<(), ReadError> {
        let current = self.reader.read().await?;
        let batch = diff::diff(self.last.as_ref(), &current);

        // The first snapshot always goes out (it bootstraps pending
        // viewers); afterwards an unchanged sheet produces no broadcast.
        if self.last.is_none() || !batch.changes.is_empty() {
            tracing::info!(
                version = batch.new_version,
                changes = batch.changes.len(),
                "board changed, broadcasting"
            );
            self.hub.ingest(batch).await;
        } else {
            tracing::debug!(version = current.version, "no changes detected");
        }

        self.last = Some(current);
        Ok(())
    }
}

/// Exponential backoff from the retry base delay, capped at the
/// configured maximum.
fn backoff_delay(poll: &PollConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(4);
    let seconds = poll
        .retry_delay_seconds
        .saturating_mul(1 << exponent)
        .min(poll.max_backoff_seconds);
    Duration::from_secs(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Scripted source: yields each queued result once, then repeats the
    /// final board forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Vec<String>>, ReadError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Vec<String>>, ReadError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl SheetSource for ScriptedSource {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ReadError> {
            self.script
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(ReadError::EmptySource))
        }
    }

    fn board(rooms: &[(&str, &str)]) -> Vec<Vec<String>> {
        rooms
            .iter()
            .map(|(room, course)| {
                vec![room.to_string(), "course".to_string(), course.to_string()]
            })
            .collect()
    }

    #[tokio::test]
    async fn unchanged_board_is_not_rebroadcast() {
        let hub = Arc::new(BroadcastHub::new(8));
        let source = ScriptedSource::new(vec![
            Ok(board(&[("101", "Math")])),
            Ok(board(&[("101", "Math")])),
        ]);
        let mut observer = SheetObserver::new(
            SnapshotReader::new(source),
            Arc::clone(&hub),
            PollConfig::default(),
        );

        observer.run_cycle().await.unwrap();
        let mut handle = hub.connect().await;
        let bootstrap = handle.rx.recv().await.unwrap();
        assert_eq!(bootstrap.new_version, 1);

        observer.run_cycle().await.unwrap();
        // Identical sheet content: nothing new queued, version unchanged.
        assert!(handle.rx.try_recv().is_err());
        assert_eq!(hub.current_snapshot().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn changes_flow_to_connected_viewers() {
        let hub = Arc::new(BroadcastHub::new(8));
        let source = ScriptedSource::new(vec![
            Ok(board(&[("101", "Math")])),
            Ok(board(&[("101", "Physics"), ("102", "Art")])),
        ]);
        let mut observer = SheetObserver::new(
            SnapshotReader::new(source),
            Arc::clone(&hub),
            PollConfig::default(),
        );

        observer.run_cycle().await.unwrap();
        let mut handle = hub.connect().await;
        assert_eq!(handle.rx.recv().await.unwrap().new_version, 1);

        observer.run_cycle().await.unwrap();
        let delta = handle.rx.recv().await.unwrap();
        assert_eq!(delta.base_version, Some(1));
        assert_eq!(delta.new_version, 2);
        assert_eq!(delta.changes.len(), 2);
    }

    /// An empty (or unavailable) sheet never wipes a populated board.
    #[tokio::test]
    async fn empty_source_keeps_last_known_state() {
        let hub = Arc::new(BroadcastHub::new(8));
        let source = ScriptedSource::new(vec![Ok(board(&[("101", "Math")])), Ok(vec![])]);
        let mut observer = SheetObserver::new(
            SnapshotReader::new(source),
            Arc::clone(&hub),
            PollConfig::default(),
        );

        observer.run_cycle().await.unwrap();
        let err = observer.run_cycle().await.unwrap_err();
        assert!(matches!(err, ReadError::EmptySource));

        let current = hub.current_snapshot().await.unwrap();
        assert_eq!(current.version, 1);
        assert!(current.entries.contains_key("101"));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let poll = PollConfig {
            interval_seconds: 20,
            max_retries: 5,
            retry_delay_seconds: 30,
            max_backoff_seconds: 300,
        };
        assert_eq!(backoff_delay(&poll, 1), Duration::from_secs(30));
        assert_eq!(backoff_delay(&poll, 2), Duration::from_secs(60));
        assert_eq!(backoff_delay(&poll, 3), Duration::from_secs(120));
        assert_eq!(backoff_delay(&poll, 4), Duration::from_secs(240));
        assert_eq!(backoff_delay(&poll, 5), Duration::from_secs(300));
        assert_eq!(backoff_delay(&poll, 12), Duration::from_secs(300));
    }
}
