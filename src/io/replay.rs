//! Replay location provider
//!
//! Plays back a recorded track (JSON lines) as if it came from the device.
//! Each line is either a fix `{"latitude": .., "longitude": .., "timestamp_ms": ..}`
//! (`"timestamp": "<RFC 3339>"` also accepted)
//! or a transient failure `{"error": "..."}`.

use crate::domain::error::LocationError;
use crate::domain::types::Position;
use crate::io::location::{
    Accuracy, LocationProvider, PermissionStatus, PositionStream, WatchOptions,
};
use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One recorded watch callback
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplayStep {
    Failure { error: String },
    Fix(Position),
}

pub struct ReplayLocationProvider {
    steps: Vec<ReplayStep>,
    pace: Duration,
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
    hold_open: bool,
}

impl ReplayLocationProvider {
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self {
            steps,
            pace: Duration::from_millis(250),
            permission: Mutex::new(PermissionStatus::Undetermined),
            grant_on_request: true,
            hold_open: false,
        }
    }

    /// Replay only successful fixes
    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        Self::new(positions.into_iter().map(ReplayStep::Fix).collect())
    }

    /// Load a JSON-lines track file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay file {}", path.display()))?;

        let mut steps = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step: ReplayStep = serde_json::from_str(line).with_context(|| {
                format!("Invalid replay line {} in {}", line_no + 1, path.display())
            })?;
            steps.push(step);
        }

        info!(file = %path.display(), steps = %steps.len(), "replay_loaded");
        Ok(Self::new(steps))
    }

    /// Delay between watch callbacks
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Simulate the user refusing the permission prompt
    pub fn denying_permission(mut self) -> Self {
        self.grant_on_request = false;
        self
    }

    /// Keep the subscription open after the last step instead of closing it
    pub fn holding_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    fn first_fix(&self) -> Option<Position> {
        self.steps.iter().find_map(|step| match step {
            ReplayStep::Fix(position) => Some(*position),
            ReplayStep::Failure { .. } => None,
        })
    }
}

#[async_trait]
impl LocationProvider for ReplayLocationProvider {
    async fn permission_status(&self) -> PermissionStatus {
        *self.permission.lock()
    }

    async fn request_permission(&self) -> PermissionStatus {
        let status =
            if self.grant_on_request { PermissionStatus::Granted } else { PermissionStatus::Denied };
        *self.permission.lock() = status;
        status
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Position, LocationError> {
        self.first_fix()
            .ok_or_else(|| LocationError::PositionUnavailable("replay has no fixes".to_string()))
    }

    async fn watch_position(&self, options: WatchOptions) -> Result<PositionStream, LocationError> {
        if *self.permission.lock() != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied);
        }

        let (tx, rx) = mpsc::channel(16);
        let steps = self.steps.clone();
        let pace = self.pace;
        let hold_open = self.hold_open;

        debug!(
            steps = %steps.len(),
            pace_ms = %pace.as_millis(),
            distance_interval_m = %options.distance_interval_m,
            "replay_watch_started"
        );

        tokio::spawn(async move {
            for step in steps {
                tokio::time::sleep(pace).await;
                let item = match step {
                    ReplayStep::Fix(position) => Ok(position),
                    ReplayStep::Failure { error } => Err(LocationError::PositionUnavailable(error)),
                };
                if tx.send(item).await.is_err() {
                    // Subscriber dropped the stream
                    return;
                }
            }
            if hold_open {
                tx.closed().await;
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file_parses_fixes_and_failures() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# morning walk").unwrap();
        writeln!(file, r#"{{"latitude": 56.46, "longitude": -2.97, "timestamp_ms": 1000}}"#).unwrap();
        writeln!(file, r#"{{"error": "gps timeout"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"lat": 56.47, "lng": -2.98, "timestamp_ms": 2000, "accuracy_m": 12.0}}"#)
            .unwrap();

        let provider = ReplayLocationProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.steps().len(), 3);
        assert_eq!(provider.steps()[0], ReplayStep::Fix(Position::new(56.46, -2.97, 1000)));
        assert!(matches!(provider.steps()[1], ReplayStep::Failure { .. }));
        assert_eq!(
            provider.steps()[2],
            ReplayStep::Fix(Position::new(56.47, -2.98, 2000).with_accuracy(12.0))
        );
    }

    #[test]
    fn test_bundled_track_mixes_timestamp_forms() {
        let provider = ReplayLocationProvider::from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/data/sample_positions.jsonl"
        ))
        .unwrap();
        let fixes: Vec<u64> = provider
            .steps()
            .iter()
            .filter_map(|step| match step {
                ReplayStep::Fix(position) => Some(position.timestamp_ms),
                ReplayStep::Failure { .. } => None,
            })
            .collect();
        assert_eq!(fixes.len(), 5);
        assert_eq!(fixes.last(), Some(&1_767_601_800_000));
        assert!(fixes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_from_file_reports_bad_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = ReplayLocationProvider::from_file(file.path()).err().unwrap();
        assert!(err.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn test_watch_requires_permission() {
        let provider = ReplayLocationProvider::from_positions([Position::new(1.0, 2.0, 0)]);
        assert_eq!(provider.permission_status().await, PermissionStatus::Undetermined);

        let options = WatchOptions {
            accuracy: Accuracy::Balanced,
            distance_interval_m: 100.0,
            time_interval_ms: 10_000,
        };
        assert_eq!(provider.watch_position(options).await.err(), Some(LocationError::PermissionDenied));

        assert_eq!(provider.request_permission().await, PermissionStatus::Granted);
        let mut stream = provider.watch_position(options).await.unwrap();
        assert_eq!(stream.recv().await, Some(Ok(Position::new(1.0, 2.0, 0))));
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_denying_permission() {
        let provider = ReplayLocationProvider::from_positions([]).denying_permission();
        assert_eq!(provider.request_permission().await, PermissionStatus::Denied);
        assert!(provider.current_position(Accuracy::High).await.is_err());
    }
}
