//! Seams to the host-provided player widget
//!
//! The widget, the script that provides it and the host timer live outside
//! this crate. Hosts implement these traits and feed widget callbacks back
//! into [`Player::handle_widget_event`](crate::Player::handle_widget_event).

use crate::config::EmbedConfig;
use crate::types::{PlaybackQuality, Size};
use crate::Result;
use std::time::Duration;

/// The loaded player API (`window.YT` in a browser)
pub trait PlayerApi {
    /// Construct a widget that replaces the element with the given id
    fn create_player(
        &self,
        element_id: &str,
        config: &EmbedConfig,
    ) -> Result<Box<dyn PlayerBackend>>;

    /// Origin reported to the widget in the `origin` embed parameter
    fn origin(&self) -> String;
}

/// One live widget instance.
///
/// Methods mirror the iframe API; getters are only meaningful once the
/// widget has signalled ready.
pub trait PlayerBackend {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn stop_video(&mut self);
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);

    fn load_video_by_id(&mut self, video_id: &str, start_seconds: f64);
    fn cue_video_by_id(&mut self, video_id: &str, start_seconds: f64);

    fn set_volume(&mut self, volume: u8);
    fn volume(&self) -> u8;
    fn mute(&mut self);
    fn un_mute(&mut self);
    fn is_muted(&self) -> bool;

    fn set_size(&mut self, size: Size);
    /// Size of the iframe element
    fn size(&self) -> Size;

    fn set_playback_rate(&mut self, rate: f64);
    fn playback_rate(&self) -> f64;
    fn available_playback_rates(&self) -> Vec<f64>;

    fn set_playback_quality(&mut self, quality: PlaybackQuality);
    fn playback_quality(&self) -> PlaybackQuality;
    fn available_quality_levels(&self) -> Vec<PlaybackQuality>;

    fn duration(&self) -> f64;
    fn current_time(&self) -> f64;
    /// Fraction of the video the widget has buffered, 0.0 to 1.0
    fn video_loaded_fraction(&self) -> f64;
    /// Raw widget state code
    fn player_state(&self) -> i32;

    /// Remove the widget from the page
    fn destroy(&mut self);
}

/// Periodic timer driving synthesized time updates.
///
/// While running, the host calls [`Player::tick`](crate::Player::tick) once per period.
pub trait Ticker {
    fn start(&mut self, period: Duration);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Callbacks raised by the widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// The widget accepts commands from now on
    Ready,
    /// Raw state code
    StateChange(i32),
    PlaybackQualityChange(PlaybackQuality),
    PlaybackRateChange(f64),
    /// Raw error code
    Error(i32),
}
