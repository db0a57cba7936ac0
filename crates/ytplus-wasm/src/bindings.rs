//! Raw bindings to the `YT` global installed by the iframe API script

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// `YT.Player`
    #[wasm_bindgen(js_namespace = YT, js_name = Player)]
    pub type YtPlayer;

    #[wasm_bindgen(constructor, catch, js_namespace = YT, js_class = "Player")]
    pub fn new(element_id: &str, options: &JsValue) -> Result<YtPlayer, JsValue>;

    #[wasm_bindgen(method, js_name = playVideo)]
    pub fn play_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = pauseVideo)]
    pub fn pause_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = stopVideo)]
    pub fn stop_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = seekTo)]
    pub fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool);

    /// Takes `{ videoId, startSeconds }`
    #[wasm_bindgen(method, js_name = loadVideoById)]
    pub fn load_video_by_id(this: &YtPlayer, args: &JsValue);

    /// Takes `{ videoId, startSeconds }`
    #[wasm_bindgen(method, js_name = cueVideoById)]
    pub fn cue_video_by_id(this: &YtPlayer, args: &JsValue);

    #[wasm_bindgen(method, js_name = setVolume)]
    pub fn set_volume(this: &YtPlayer, volume: f64);

    #[wasm_bindgen(method, js_name = getVolume)]
    pub fn get_volume(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method)]
    pub fn mute(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = unMute)]
    pub fn un_mute(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = isMuted)]
    pub fn is_muted(this: &YtPlayer) -> bool;

    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &YtPlayer, width: u32, height: u32);

    #[wasm_bindgen(method, js_name = getIframe)]
    pub fn get_iframe(this: &YtPlayer) -> Option<web_sys::HtmlIFrameElement>;

    #[wasm_bindgen(method, js_name = setPlaybackRate)]
    pub fn set_playback_rate(this: &YtPlayer, rate: f64);

    #[wasm_bindgen(method, js_name = getPlaybackRate)]
    pub fn get_playback_rate(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getAvailablePlaybackRates)]
    pub fn get_available_playback_rates(this: &YtPlayer) -> js_sys::Array;

    #[wasm_bindgen(method, js_name = setPlaybackQuality)]
    pub fn set_playback_quality(this: &YtPlayer, quality: &str);

    #[wasm_bindgen(method, js_name = getPlaybackQuality)]
    pub fn get_playback_quality(this: &YtPlayer) -> String;

    #[wasm_bindgen(method, js_name = getAvailableQualityLevels)]
    pub fn get_available_quality_levels(this: &YtPlayer) -> js_sys::Array;

    #[wasm_bindgen(method, js_name = getDuration)]
    pub fn get_duration(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getCurrentTime)]
    pub fn get_current_time(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getVideoLoadedFraction)]
    pub fn get_video_loaded_fraction(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method, js_name = getPlayerState)]
    pub fn get_player_state(this: &YtPlayer) -> f64;

    #[wasm_bindgen(method)]
    pub fn destroy(this: &YtPlayer);

    /// Argument of every widget callback
    pub type WidgetCallbackEvent;

    #[wasm_bindgen(method, getter)]
    pub fn data(this: &WidgetCallbackEvent) -> JsValue;
}

/// True once `window.YT.Player` is a constructor
pub fn api_available() -> bool {
    let global = js_sys::global();
    js_sys::Reflect::get(&global, &JsValue::from_str("YT"))
        .ok()
        .filter(|yt| yt.is_object())
        .and_then(|yt| js_sys::Reflect::get(&yt, &JsValue::from_str("Player")).ok())
        .is_some_and(|player| player.is_function())
}

/// Best-effort message for a thrown JS value
pub fn js_error_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
