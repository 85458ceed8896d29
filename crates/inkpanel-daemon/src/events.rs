//! Typed channels between device subsystems and the display worker.
//!
//! Each message kind has its own bounded channel, so ordering is only
//! guaranteed per kind.

#![allow(dead_code)]

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;

/// Result payload produced by the remote lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.artist.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.title, self.artist)
        }
    }
}

/// A message consumed by the display worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RecordRequested,
    PlayRequested,
    FetchCompleted(Track),
    DisplayRecordState(bool),
    DisplayThinkingState(bool),
}

/// Sending halves, cloned out to collaborators.
#[derive(Debug, Clone)]
pub struct EventSenders {
    pub record: mpsc::Sender<()>,
    pub play: mpsc::Sender<()>,
    pub fetched: mpsc::Sender<Track>,
    pub recording: mpsc::Sender<bool>,
    pub thinking: mpsc::Sender<bool>,
}

impl EventSenders {
    /// Routes an event to its channel.
    pub async fn send(&self, event: Event) -> Result<(), SendError<Event>> {
        let closed = match event {
            Event::RecordRequested => self.record.send(()).await.is_err(),
            Event::PlayRequested => self.play.send(()).await.is_err(),
            Event::FetchCompleted(ref track) => self.fetched.send(track.clone()).await.is_err(),
            Event::DisplayRecordState(on) => self.recording.send(on).await.is_err(),
            Event::DisplayThinkingState(on) => self.thinking.send(on).await.is_err(),
        };
        if closed {
            Err(SendError(event))
        } else {
            Ok(())
        }
    }
}

/// Receiving halves, owned by the display worker.
#[derive(Debug)]
pub struct EventReceivers {
    record: mpsc::Receiver<()>,
    play: mpsc::Receiver<()>,
    fetched: mpsc::Receiver<Track>,
    recording: mpsc::Receiver<bool>,
    thinking: mpsc::Receiver<bool>,
}

impl EventReceivers {
    /// Waits for the next event on any channel.
    ///
    /// Returns `None` once every channel is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        tokio::select! {
            Some(()) = self.record.recv() => Some(Event::RecordRequested),
            Some(()) = self.play.recv() => Some(Event::PlayRequested),
            Some(track) = self.fetched.recv() => Some(Event::FetchCompleted(track)),
            Some(on) = self.recording.recv() => Some(Event::DisplayRecordState(on)),
            Some(on) = self.thinking.recv() => Some(Event::DisplayThinkingState(on)),
            else => None,
        }
    }
}

/// Creates one bounded channel per event kind.
pub fn channels(capacity: usize) -> (EventSenders, EventReceivers) {
    let (record_tx, record_rx) = mpsc::channel(capacity);
    let (play_tx, play_rx) = mpsc::channel(capacity);
    let (fetched_tx, fetched_rx) = mpsc::channel(capacity);
    let (recording_tx, recording_rx) = mpsc::channel(capacity);
    let (thinking_tx, thinking_rx) = mpsc::channel(capacity);

    (
        EventSenders {
            record: record_tx,
            play: play_tx,
            fetched: fetched_tx,
            recording: recording_tx,
            thinking: thinking_tx,
        },
        EventReceivers {
            record: record_rx,
            play: play_rx,
            fetched: fetched_rx,
            recording: recording_rx,
            thinking: thinking_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_each_kind() {
        let (tx, mut rx) = channels(4);
        let track = Track {
            title: "Windowlicker".into(),
            artist: "Aphex Twin".into(),
        };

        tx.send(Event::FetchCompleted(track.clone())).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::FetchCompleted(track)));

        tx.send(Event::DisplayThinkingState(true)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::DisplayThinkingState(true)));
    }

    #[tokio::test]
    async fn test_per_channel_fifo() {
        let (tx, mut rx) = channels(4);
        tx.send(Event::DisplayRecordState(true)).await.unwrap();
        tx.send(Event::DisplayRecordState(false)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::DisplayRecordState(true)));
        assert_eq!(rx.recv().await, Some(Event::DisplayRecordState(false)));
    }

    #[tokio::test]
    async fn test_closed_when_all_senders_dropped() {
        let (tx, mut rx) = channels(4);
        tx.send(Event::PlayRequested).await.unwrap();
        drop(tx);
        assert_eq!(rx.recv().await, Some(Event::PlayRequested));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_track_display() {
        let track = Track {
            title: "Teardrop".into(),
            artist: String::new(),
        };
        assert_eq!(track.to_string(), "Teardrop");
    }
}
