//! ytplus WASM - the player facade in the browser
//!
//! Binds `ytplus-core` to the real iframe API:
//! - Loads `https://www.youtube.com/iframe_api` once per page
//! - Drives `YT.Player` through the core backend traits
//! - Runs time updates off `setInterval`
//! - Exposes the `YouTubePlayerPlus` class with `on` / `off` / `once` listeners
//!
//! ## Usage
//!
//! ```javascript
//! import init, { YouTubePlayerPlus } from '@ytplus/wasm';
//!
//! await init();
//! const player = new YouTubePlayerPlus('#player', { autoplay: true });
//! player.on('playing', () => console.log('playing'));
//! player.load('KGQdWaD6XHM');
//! ```

use wasm_bindgen::prelude::*;

mod backend;
mod bindings;
mod loader;
mod player;
mod ticker;

pub use backend::{JsPlayerApi, JsPlayerBackend};
pub use player::YouTubePlayerPlus;
pub use ticker::IntervalTicker;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    ytplus_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    ytplus_core::VERSION.to_string()
}

/// Embed parameters the player would be created with, as a plain object.
///
/// Handy for checking an options object before creating a player.
#[wasm_bindgen(js_name = embedConfig)]
pub fn embed_config(video_id: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options: ytplus_core::PlayerOptions = if options.is_undefined() || options.is_null() {
        Default::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    options
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    serde_wasm_bindgen::to_value(&options.embed_config(video_id, &origin)).map_err(Into::into)
}
