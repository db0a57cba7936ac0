//! Core types for ytplus

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Playback rates the embedded player accepts
pub const PLAYBACK_RATES: [f64; 5] = [0.25, 0.5, 1.0, 1.5, 2.0];

/// Returns true if `rate` is one of [`PLAYBACK_RATES`]
pub fn is_supported_rate(rate: f64) -> bool {
    PLAYBACK_RATES.iter().any(|r| (r - rate).abs() < f64::EPSILON)
}

/// Widget player states, carrying the numeric codes the iframe API reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// No video has started yet
    Unstarted,
    /// Playback reached the end
    Ended,
    /// Video is playing
    Playing,
    /// Playback paused
    Paused,
    /// Buffering content
    Buffering,
    /// Video cued and ready to play
    Cued,
}

impl PlayerState {
    /// All states, in code order
    pub const ALL: [PlayerState; 6] = [
        PlayerState::Unstarted,
        PlayerState::Ended,
        PlayerState::Playing,
        PlayerState::Paused,
        PlayerState::Buffering,
        PlayerState::Cued,
    ];

    /// Translate a widget state code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }

    /// Numeric widget code
    pub fn code(&self) -> i32 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
        }
    }

    /// Event name published for this state
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Unstarted => "unstarted",
            PlayerState::Ended => "ended",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Cued => "cued",
        }
    }

    /// Playback halted; time stops advancing until the video resumes
    pub fn is_halted(&self) -> bool {
        matches!(
            self,
            PlayerState::Paused | PlayerState::Buffering | PlayerState::Ended
        )
    }

    /// The video changed or started; the reported time must be reset afterwards
    pub fn resets_time(&self) -> bool {
        matches!(
            self,
            PlayerState::Unstarted | PlayerState::Playing | PlayerState::Cued
        )
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error codes reported by the widget's `onError` callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetErrorCode {
    InvalidParam,
    Html5Error,
    NotFound,
    Unplayable1,
    Unplayable2,
}

impl WidgetErrorCode {
    pub const ALL: [WidgetErrorCode; 5] = [
        WidgetErrorCode::InvalidParam,
        WidgetErrorCode::Html5Error,
        WidgetErrorCode::NotFound,
        WidgetErrorCode::Unplayable1,
        WidgetErrorCode::Unplayable2,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            2 => Some(WidgetErrorCode::InvalidParam),
            5 => Some(WidgetErrorCode::Html5Error),
            100 => Some(WidgetErrorCode::NotFound),
            101 => Some(WidgetErrorCode::Unplayable1),
            150 => Some(WidgetErrorCode::Unplayable2),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            WidgetErrorCode::InvalidParam => 2,
            WidgetErrorCode::Html5Error => 5,
            WidgetErrorCode::NotFound => 100,
            WidgetErrorCode::Unplayable1 => 101,
            WidgetErrorCode::Unplayable2 => 150,
        }
    }

    /// The requested video cannot be played, but the player is still usable
    pub fn is_unplayable(&self) -> bool {
        !matches!(self, WidgetErrorCode::Html5Error)
    }

    /// Human-readable explanation
    pub fn explain(&self) -> &'static str {
        match self {
            WidgetErrorCode::InvalidParam => "The request contains an invalid parameter value.",
            WidgetErrorCode::Html5Error => {
                "The request content cannot be played in an HTML5 player or another error \
                 related to the HTML5 player has occurred."
            }
            WidgetErrorCode::NotFound => "The video requested was not found.",
            WidgetErrorCode::Unplayable1 => {
                "The owner of the requested video does not allow it to be played in embedded \
                 players."
            }
            WidgetErrorCode::Unplayable2 => {
                "This error is the same as 101. The owner of the requested video does not allow \
                 it to be played in embedded players."
            }
        }
    }
}

/// Suggested playback quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackQuality {
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    Highres,
    #[default]
    Default,
}

impl PlaybackQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackQuality::Small => "small",
            PlaybackQuality::Medium => "medium",
            PlaybackQuality::Large => "large",
            PlaybackQuality::Hd720 => "hd720",
            PlaybackQuality::Hd1080 => "hd1080",
            PlaybackQuality::Highres => "highres",
            PlaybackQuality::Default => "default",
        }
    }
}

impl FromStr for PlaybackQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(PlaybackQuality::Small),
            "medium" => Ok(PlaybackQuality::Medium),
            "large" => Ok(PlaybackQuality::Large),
            "hd720" => Ok(PlaybackQuality::Hd720),
            "hd1080" => Ok(PlaybackQuality::Hd1080),
            "highres" => Ok(PlaybackQuality::Highres),
            "default" => Ok(PlaybackQuality::Default),
            other => Err(format!("unknown playback quality: {other}")),
        }
    }
}

impl std::fmt::Display for PlaybackQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player frame size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The last requested video load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub video_id: String,
    pub autoplay: bool,
    /// Start offset in seconds
    pub start: f64,
}

impl VideoRequest {
    pub fn new(video_id: impl Into<String>, autoplay: bool, start: f64) -> Self {
        Self {
            video_id: video_id.into(),
            autoplay,
            start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        for state in PlayerState::ALL {
            assert_eq!(PlayerState::from_code(state.code()), Some(state));
        }
        assert_eq!(PlayerState::from_code(4), None);
        assert_eq!(PlayerState::from_code(-2), None);
        assert_eq!(PlayerState::Cued.to_string(), "cued");
    }

    #[test]
    fn test_time_update_ordering_sets() {
        assert!(PlayerState::Paused.is_halted());
        assert!(!PlayerState::Paused.resets_time());
        assert!(PlayerState::Cued.resets_time());
        assert!(!PlayerState::Cued.is_halted());
    }

    #[test]
    fn test_widget_error_codes() {
        assert_eq!(WidgetErrorCode::from_code(150), Some(WidgetErrorCode::Unplayable2));
        assert_eq!(WidgetErrorCode::from_code(7), None);
        assert!(!WidgetErrorCode::Html5Error.is_unplayable());
        assert!(WidgetErrorCode::NotFound.is_unplayable());
    }

    #[test]
    fn test_playback_rates() {
        assert!(is_supported_rate(1.5));
        assert!(!is_supported_rate(1.25));
        assert!(!is_supported_rate(0.0));
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("hd720".parse::<PlaybackQuality>(), Ok(PlaybackQuality::Hd720));
        assert!("4k".parse::<PlaybackQuality>().is_err());
        assert_eq!(
            serde_json::to_string(&PlaybackQuality::Hd1080).unwrap(),
            "\"hd1080\""
        );
    }
}
