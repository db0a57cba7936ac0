//! Player events and the bus that fans them out

use crate::types::{PlaybackQuality, PlayerState};
use serde::Serialize;
use tokio::sync::broadcast;

/// Events published by the player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum PlayerEvent {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "stateChange")]
    StateChange(PlayerState),
    #[serde(rename = "unstarted")]
    Unstarted,
    #[serde(rename = "ended")]
    Ended,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "buffering")]
    Buffering,
    #[serde(rename = "cued")]
    Cued,
    /// Current playback position in seconds
    #[serde(rename = "timeupdate")]
    TimeUpdate(f64),
    #[serde(rename = "playbackQualityChange")]
    PlaybackQualityChange(PlaybackQuality),
    #[serde(rename = "playbackRateChange")]
    PlaybackRateChange(f64),
    /// The requested video cannot be played; carries its id
    #[serde(rename = "unplayable")]
    Unplayable(String),
    /// Fatal error; the player has been torn down
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl PlayerEvent {
    /// Event name listeners subscribe to
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Ready => "ready",
            PlayerEvent::StateChange(_) => "stateChange",
            PlayerEvent::Unstarted => "unstarted",
            PlayerEvent::Ended => "ended",
            PlayerEvent::Playing => "playing",
            PlayerEvent::Paused => "paused",
            PlayerEvent::Buffering => "buffering",
            PlayerEvent::Cued => "cued",
            PlayerEvent::TimeUpdate(_) => "timeupdate",
            PlayerEvent::PlaybackQualityChange(_) => "playbackQualityChange",
            PlayerEvent::PlaybackRateChange(_) => "playbackRateChange",
            PlayerEvent::Unplayable(_) => "unplayable",
            PlayerEvent::Error { .. } => "error",
        }
    }

    /// The per-state event for a widget state
    pub fn for_state(state: PlayerState) -> Self {
        match state {
            PlayerState::Unstarted => PlayerEvent::Unstarted,
            PlayerState::Ended => PlayerEvent::Ended,
            PlayerState::Playing => PlayerEvent::Playing,
            PlayerState::Paused => PlayerEvent::Paused,
            PlayerState::Buffering => PlayerEvent::Buffering,
            PlayerState::Cued => PlayerEvent::Cued,
        }
    }

    pub fn from_error(error: &crate::Error) -> Self {
        PlayerEvent::Error {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerEvent::StateChange(state) => write!(f, "stateChange({state})"),
            PlayerEvent::TimeUpdate(seconds) => write!(f, "timeupdate({seconds:.3})"),
            PlayerEvent::PlaybackQualityChange(q) => write!(f, "playbackQualityChange({q})"),
            PlayerEvent::PlaybackRateChange(rate) => write!(f, "playbackRateChange({rate})"),
            PlayerEvent::Unplayable(id) => write!(f, "unplayable({id})"),
            PlayerEvent::Error { code, message } => write!(f, "error({code}: {message})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Broadcast bus for player events.
///
/// `publish()` is a sync call. Events published while nobody is subscribed
/// are dropped; each subscriber sees every event published after it subscribed.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Default channel capacity
    pub const DEFAULT_CAPACITY: usize = 256;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events.
    ///
    /// Slow subscribers receive `RecvError::Lagged(n)` instead of blocking the player.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(PlayerEvent::Ready);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        bus.publish(PlayerEvent::TimeUpdate(1.5));
        assert_eq!(rx1.recv().await.unwrap(), PlayerEvent::TimeUpdate(1.5));
        assert_eq!(rx2.recv().await.unwrap(), PlayerEvent::TimeUpdate(1.5));
    }

    #[tokio::test]
    async fn lagged_subscriber_gets_error() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..10 {
            bus.publish(PlayerEvent::TimeUpdate(i as f64));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[test]
    fn event_names_and_json() {
        assert_eq!(PlayerEvent::TimeUpdate(0.0).name(), "timeupdate");
        assert_eq!(PlayerEvent::for_state(PlayerState::Cued), PlayerEvent::Cued);

        let json = serde_json::to_value(PlayerEvent::StateChange(PlayerState::Playing)).unwrap();
        assert_eq!(json["event"], "stateChange");
        assert_eq!(json["data"], "playing");
    }
}
