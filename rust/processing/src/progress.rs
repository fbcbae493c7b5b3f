// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Progress reporting for loads
//!
//! Sinks are called synchronously from the loading task and must return
//! quickly. [`ChannelProgress`] never blocks: when its buffer is full the
//! update is dropped.

use std::sync::Mutex;

use tokio::sync::mpsc;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    /// 0 to 100, monotonic within an attempt
    pub percent: u8,
    /// Human-readable stage label
    pub stage: String,
    /// 1-based parse attempt the update belongs to
    pub attempt: u32,
}

impl LoadProgress {
    pub fn new(percent: u8, stage: impl Into<String>, attempt: u32) -> Self {
        Self {
            percent: percent.min(100),
            stage: stage.into(),
            attempt,
        }
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: LoadProgress);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: LoadProgress) {}
}

/// Calls a closure for each update
pub struct ClosureProgress<F>
where
    F: Fn(u8, &str) + Send + Sync,
{
    closure: F,
}

impl<F> ClosureProgress<F>
where
    F: Fn(u8, &str) + Send + Sync,
{
    pub fn new(closure: F) -> Self {
        Self { closure }
    }
}

impl<F> ProgressSink for ClosureProgress<F>
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn report(&self, progress: LoadProgress) {
        (self.closure)(progress.percent, &progress.stage);
    }
}

/// Forwards updates into a bounded channel, dropping them when it is full
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::Sender<LoadProgress>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::Sender<LoadProgress>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end of a channel holding `capacity` updates
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LoadProgress>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, progress: LoadProgress) {
        if let Err(mpsc::error::TrySendError::Full(dropped)) = self.sender.try_send(progress) {
            tracing::trace!(percent = dropped.percent, "progress channel full, dropping update");
        }
    }
}

/// Keeps every update, for inspection after the load
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<LoadProgress>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<LoadProgress> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, progress: LoadProgress) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};

    #[test]
    fn test_closure_progress() {
        let last = AtomicU8::new(0);
        let sink = ClosureProgress::new(|percent, _stage: &str| last.store(percent, Ordering::SeqCst));
        sink.report(LoadProgress::new(42, "Parsing", 1));
        assert_eq!(last.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_percent_is_capped() {
        assert_eq!(LoadProgress::new(250, "x", 1).percent, 100);
    }

    #[tokio::test]
    async fn test_channel_drops_when_full() {
        let (sink, mut receiver) = ChannelProgress::channel(1);
        sink.report(LoadProgress::new(10, "a", 1));
        sink.report(LoadProgress::new(30, "b", 1));
        assert_eq!(receiver.recv().await.map(|p| p.percent), Some(10));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_recording_progress() {
        let sink = RecordingProgress::new();
        sink.report(LoadProgress::new(10, "a", 1));
        sink.report(LoadProgress::new(100, "b", 1));
        let percents: Vec<u8> = sink.updates().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![10, 100]);
    }
}
