//! Player options and the embed parameters derived from them
//!
//! Parameter reference:
//! - https://developers.google.com/youtube/iframe_api_reference#Loading_a_Video_Player
//! - https://developers.google.com/youtube/player_parameters.html#Parameters

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Privacy-enhanced host the player loads videos from by default
pub const DEFAULT_HOST: &str = "https://www.youtube-nocookie.com";

/// Host timers never fire faster than this
pub const MIN_TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(4);

/// Prefix of generated element ids
pub const ELEMENT_ID_PREFIX: &str = "yt-iframe-";

/// Generate an element id for a host element that has none
pub fn generate_element_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{ELEMENT_ID_PREFIX}{}", &suffix[..9])
}

/// Player options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerOptions {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Start the initial video automatically
    pub autoplay: bool,
    /// Host the videos are loaded from
    pub host: String,
    /// Caption language; empty turns captions off, unset keeps the viewer's preference
    pub captions: Option<String>,
    /// Show player controls
    pub controls: bool,
    /// Respond to keyboard controls
    pub keyboard: bool,
    /// Loop the video when it ends
    #[serde(rename = "loop")]
    pub loop_video: bool,
    /// Show the fullscreen button
    pub fullscreen: bool,
    /// Show video annotations
    pub annotations: bool,
    /// Hide the YouTube logo in the control bar
    pub modest_branding: bool,
    /// Show related videos from any channel when playback ends
    pub related_videos: bool,
    /// Interval between synthesized time updates, in milliseconds
    pub time_update_frequency: u64,
    /// Play inline on iOS instead of fullscreen
    pub plays_inline: bool,
    /// Initial start offset in seconds
    pub start: u32,
    /// Log state changes at info level
    pub debug: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            autoplay: false,
            host: DEFAULT_HOST.to_string(),
            captions: None,
            controls: true,
            keyboard: true,
            loop_video: false,
            fullscreen: true,
            annotations: true,
            modest_branding: false,
            related_videos: true,
            time_update_frequency: 0,
            plays_inline: true,
            start: 0,
            debug: false,
        }
    }
}

impl PlayerOptions {
    /// Minimal chrome: no controls, keyboard, annotations or related videos
    pub fn chromeless() -> Self {
        Self {
            controls: false,
            keyboard: false,
            annotations: false,
            modest_branding: true,
            related_videos: false,
            ..Default::default()
        }
    }

    /// Parse options from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options are usable
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "player size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        let host = Url::parse(&self.host)
            .map_err(|e| Error::InvalidConfig(format!("invalid host {:?}: {e}", self.host)))?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "host must be http(s), got {:?}",
                self.host
            )));
        }

        Ok(())
    }

    /// Time update period, floored to what host timers can deliver
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_frequency).max(MIN_TIME_UPDATE_INTERVAL)
    }

    /// Build the configuration handed to the widget constructor
    pub fn embed_config(&self, video_id: &str, origin: &str) -> EmbedConfig {
        let captions = self.captions.as_deref();
        let language = captions.filter(|c| !c.is_empty()).map(str::to_string);

        EmbedConfig {
            width: self.width,
            height: self.height,
            video_id: video_id.to_string(),
            host: self.host.clone(),
            player_vars: PlayerVars {
                autoplay: self.autoplay.into(),
                cc_load_policy: captions.map(|c| u8::from(!c.is_empty())),
                hl: language.clone(),
                cc_lang_pref: language,
                controls: if self.controls { 2 } else { 0 },
                disablekb: (!self.keyboard).into(),
                enablejsapi: 1,
                fs: self.fullscreen.into(),
                iv_load_policy: if self.annotations { 1 } else { 3 },
                modestbranding: self.modest_branding.into(),
                origin: origin.to_string(),
                playsinline: self.plays_inline.into(),
                rel: self.related_videos.into(),
                wmode: "opaque".to_string(),
                start: (self.start > 0).then_some(self.start),
                loop_video: self.loop_video.into(),
                playlist: self.loop_video.then(|| video_id.to_string()),
                showinfo: 1,
            },
        }
    }
}

/// Constructor options of the widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    pub width: u32,
    pub height: u32,
    pub video_id: String,
    /// Not part of the documented API; selects the video host
    pub host: String,
    pub player_vars: PlayerVars,
}

/// Embed parameters, serialized with the names the player expects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerVars {
    pub autoplay: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_load_policy: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_lang_pref: Option<String>,
    /// 0 hides the controls, 2 shows them and defers loading until playback
    pub controls: u8,
    pub disablekb: u8,
    pub enablejsapi: u8,
    pub fs: u8,
    /// 1 shows annotations, 3 hides them
    pub iv_load_policy: u8,
    pub modestbranding: u8,
    pub origin: String,
    pub playsinline: u8,
    pub rel: u8,
    /// Lets elements with a higher z-index render over the frame
    pub wmode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(rename = "loop")]
    pub loop_video: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
    pub showinfo: u8,
}
