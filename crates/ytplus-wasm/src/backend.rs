//! `YT.Player` behind the core backend traits

use std::rc::Weak;

use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use ytplus_core::{
    EmbedConfig, Error, PlaybackQuality, PlayerApi, PlayerBackend, Result, Size, WidgetEvent,
};

use crate::bindings::{js_error_message, WidgetCallbackEvent, YtPlayer};
use crate::player::{Inbound, Shared};

/// Arguments of `loadVideoById` / `cueVideoById`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoArgs<'a> {
    video_id: &'a str,
    start_seconds: f64,
}

/// The loaded `window.YT`; widget callbacks go to the owning player
pub struct JsPlayerApi {
    shared: Weak<Shared>,
}

impl JsPlayerApi {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    fn callback(
        &self,
        convert: fn(JsValue) -> Option<WidgetEvent>,
    ) -> Closure<dyn FnMut(WidgetCallbackEvent)> {
        let shared = self.shared.clone();
        Closure::new(move |event: WidgetCallbackEvent| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            match convert(event.data()) {
                Some(event) => shared.deliver(Inbound::Widget(event)),
                None => warn!("Dropped widget callback with unexpected payload"),
            }
        })
    }
}

impl PlayerApi for JsPlayerApi {
    fn create_player(
        &self,
        element_id: &str,
        config: &EmbedConfig,
    ) -> Result<Box<dyn PlayerBackend>> {
        let options = serde_wasm_bindgen::to_value(config)
            .map_err(|e| Error::WidgetCreation(e.to_string()))?;

        let callbacks = vec![
            ("onReady", self.callback(|_| Some(WidgetEvent::Ready))),
            (
                "onStateChange",
                self.callback(|data| {
                    data.as_f64()
                        .map(|code| WidgetEvent::StateChange(code as i32))
                }),
            ),
            (
                "onPlaybackQualityChange",
                self.callback(|data| {
                    let quality = data.as_string()?.parse().unwrap_or_default();
                    Some(WidgetEvent::PlaybackQualityChange(quality))
                }),
            ),
            (
                "onPlaybackRateChange",
                self.callback(|data| data.as_f64().map(WidgetEvent::PlaybackRateChange)),
            ),
            (
                "onError",
                self.callback(|data| data.as_f64().map(|code| WidgetEvent::Error(code as i32))),
            ),
        ];

        let events = js_sys::Object::new();
        for (name, callback) in &callbacks {
            js_sys::Reflect::set(&events, &JsValue::from_str(name), callback.as_ref())
                .map_err(|e| Error::WidgetCreation(js_error_message(&e)))?;
        }
        js_sys::Reflect::set(&options, &JsValue::from_str("events"), &events)
            .map_err(|e| Error::WidgetCreation(js_error_message(&e)))?;

        let player = YtPlayer::new(element_id, &options)
            .map_err(|e| Error::WidgetCreation(js_error_message(&e)))?;

        Ok(Box::new(JsPlayerBackend {
            player,
            _callbacks: callbacks.into_iter().map(|(_, callback)| callback).collect(),
        }))
    }

    fn origin(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default()
    }
}

/// One `YT.Player` and the callbacks it holds on to
pub struct JsPlayerBackend {
    player: YtPlayer,
    _callbacks: Vec<Closure<dyn FnMut(WidgetCallbackEvent)>>,
}

impl JsPlayerBackend {
    fn video_args(video_id: &str, start_seconds: f64) -> Option<JsValue> {
        serde_wasm_bindgen::to_value(&VideoArgs {
            video_id,
            start_seconds,
        })
        .map_err(|e| warn!(error = %e, "Could not build video arguments"))
        .ok()
    }
}

fn numbers(array: js_sys::Array) -> Vec<f64> {
    array.iter().filter_map(|v| v.as_f64()).collect()
}

impl PlayerBackend for JsPlayerBackend {
    fn play_video(&mut self) {
        self.player.play_video();
    }

    fn pause_video(&mut self) {
        self.player.pause_video();
    }

    fn stop_video(&mut self) {
        self.player.stop_video();
    }

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
        self.player.seek_to(seconds, allow_seek_ahead);
    }

    fn load_video_by_id(&mut self, video_id: &str, start_seconds: f64) {
        if let Some(args) = Self::video_args(video_id, start_seconds) {
            self.player.load_video_by_id(&args);
        }
    }

    fn cue_video_by_id(&mut self, video_id: &str, start_seconds: f64) {
        if let Some(args) = Self::video_args(video_id, start_seconds) {
            self.player.cue_video_by_id(&args);
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.player.set_volume(f64::from(volume));
    }

    fn volume(&self) -> u8 {
        self.player.get_volume().clamp(0.0, 100.0) as u8
    }

    fn mute(&mut self) {
        self.player.mute();
    }

    fn un_mute(&mut self) {
        self.player.un_mute();
    }

    fn is_muted(&self) -> bool {
        self.player.is_muted()
    }

    fn set_size(&mut self, size: Size) {
        self.player.set_size(size.width, size.height);
    }

    fn size(&self) -> Size {
        let Some(iframe) = self.player.get_iframe() else {
            return Size::default();
        };
        Size::new(
            iframe.width().parse().unwrap_or(0),
            iframe.height().parse().unwrap_or(0),
        )
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.player.set_playback_rate(rate);
    }

    fn playback_rate(&self) -> f64 {
        self.player.get_playback_rate()
    }

    fn available_playback_rates(&self) -> Vec<f64> {
        numbers(self.player.get_available_playback_rates())
    }

    fn set_playback_quality(&mut self, quality: PlaybackQuality) {
        self.player.set_playback_quality(quality.as_str());
    }

    fn playback_quality(&self) -> PlaybackQuality {
        self.player.get_playback_quality().parse().unwrap_or_default()
    }

    fn available_quality_levels(&self) -> Vec<PlaybackQuality> {
        self.player
            .get_available_quality_levels()
            .iter()
            .filter_map(|v| v.as_string())
            .filter_map(|level| level.parse().ok())
            .collect()
    }

    fn duration(&self) -> f64 {
        self.player.get_duration()
    }

    fn current_time(&self) -> f64 {
        self.player.get_current_time()
    }

    fn video_loaded_fraction(&self) -> f64 {
        self.player.get_video_loaded_fraction()
    }

    fn player_state(&self) -> i32 {
        self.player.get_player_state() as i32
    }

    fn destroy(&mut self) {
        self.player.destroy();
    }
}

