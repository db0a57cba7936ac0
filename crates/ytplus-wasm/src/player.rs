//! `YouTubePlayerPlus`, the JS face of the core player
//!
//! The core `Player` lives in a `RefCell` shared with the widget callbacks and
//! the interval timer. A callback that arrives while the player is busy (the
//! widget may call back synchronously from inside a command) is parked in an
//! inbox and handled by whoever holds the player once they let go. Events are
//! handed to JS listeners only when the player is free, so listeners may call
//! back into the player.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use tokio::sync::broadcast;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use ytplus_core::config::generate_element_id;
use ytplus_core::{Error, PlaybackQuality, Player, PlayerEvent, PlayerOptions, WidgetEvent};

use crate::backend::JsPlayerApi;
use crate::loader::load_iframe_api;
use crate::ticker::{IntervalTicker, SharedSlot};

/// Work arriving from outside a player call
pub(crate) enum Inbound {
    ApiLoaded,
    ApiFailed(String),
    Widget(WidgetEvent),
    Tick,
}

struct Listener {
    callback: js_sys::Function,
    once: bool,
}

pub(crate) struct Shared {
    player: RefCell<Player>,
    inbox: RefCell<VecDeque<Inbound>>,
    events: RefCell<broadcast::Receiver<PlayerEvent>>,
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
}

impl Shared {
    pub(crate) fn deliver(self: &Rc<Self>, inbound: Inbound) {
        self.inbox.borrow_mut().push_back(inbound);
        self.pump();
    }

    fn with_player<R>(self: &Rc<Self>, f: impl FnOnce(&mut Player) -> R) -> R {
        let result = f(&mut *self.player.borrow_mut());
        self.pump();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&Player) -> R) -> R {
        f(&*self.player.borrow())
    }

    fn pump(self: &Rc<Self>) {
        loop {
            // Busy: the caller holding the player pumps when it returns
            let Ok(mut player) = self.player.try_borrow_mut() else {
                return;
            };
            let Some(inbound) = self.inbox.borrow_mut().pop_front() else {
                break;
            };
            match inbound {
                Inbound::ApiLoaded => {
                    let api = JsPlayerApi::new(Rc::downgrade(self));
                    if let Err(err) = player.api_loaded(Box::new(api)) {
                        warn!(error = %err, "Widget creation failed");
                    }
                }
                Inbound::ApiFailed(reason) => player.api_failed(reason),
                Inbound::Widget(event) => {
                    if let Err(err) = player.handle_widget_event(event) {
                        warn!(error = %err, "Widget callback rejected");
                    }
                }
                Inbound::Tick => player.tick(),
            }
        }
        self.dispatch();
    }

    fn dispatch(&self) {
        let events: Vec<PlayerEvent> = {
            let mut rx = self.events.borrow_mut();
            let mut events = Vec::new();
            loop {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Listeners fell behind");
                    }
                    Err(_) => break,
                }
            }
            events
        };

        for event in events {
            let callbacks: Vec<js_sys::Function> = {
                let mut listeners = self.listeners.borrow_mut();
                let Some(registered) = listeners.get_mut(event.name()) else {
                    continue;
                };
                let callbacks = registered.iter().map(|l| l.callback.clone()).collect();
                registered.retain(|l| !l.once);
                callbacks
            };
            let payload = event_payload(&event);
            for callback in callbacks {
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    web_sys::console::error_2(&JsValue::from_str("ytplus listener threw"), &err);
                }
            }
        }
    }
}

/// Argument passed to listeners of `event`
fn event_payload(event: &PlayerEvent) -> JsValue {
    match event {
        PlayerEvent::StateChange(state) => JsValue::from_str(state.name()),
        PlayerEvent::TimeUpdate(seconds) => JsValue::from_f64(*seconds),
        PlayerEvent::PlaybackQualityChange(quality) => JsValue::from_str(quality.as_str()),
        PlayerEvent::PlaybackRateChange(rate) => JsValue::from_f64(*rate),
        PlayerEvent::Unplayable(video_id) => JsValue::from_str(video_id),
        PlayerEvent::Error { code, message } => {
            let error = js_sys::Error::new(message);
            let _ = js_sys::Reflect::set(
                &error,
                &JsValue::from_str("code"),
                &JsValue::from_str(code),
            );
            error.into()
        }
        _ => JsValue::UNDEFINED,
    }
}

fn to_js(err: Error) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    let _ = js_sys::Reflect::set(
        &error,
        &JsValue::from_str("code"),
        &JsValue::from_str(err.error_code()),
    );
    error.into()
}

/// Find the target element and make sure it has an id the widget can replace
fn resolve_element(element: &JsValue) -> Result<String, JsValue> {
    let target = match element.as_string() {
        Some(selector) => web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| to_js(Error::ElementNotFound(selector.clone())))?
            .query_selector(&selector)?
            .ok_or_else(|| to_js(Error::ElementNotFound(selector)))?,
        None => element
            .clone()
            .dyn_into::<web_sys::Element>()
            .map_err(|_| to_js(Error::ElementNotFound(format!("{element:?}"))))?,
    };

    if target.id().is_empty() {
        target.set_id(&generate_element_id());
    }
    Ok(target.id())
}

/// YouTube player with queued commands and named events.
///
/// ```javascript
/// const player = new YouTubePlayerPlus('#player', { timeUpdateFrequency: 250 });
/// player.load('KGQdWaD6XHM', true);
/// player.setVolume(40);
/// player.on('timeupdate', (seconds) => console.log(seconds));
/// ```
#[wasm_bindgen(js_name = YouTubePlayerPlus)]
pub struct YouTubePlayerPlus {
    shared: Rc<Shared>,
}

#[wasm_bindgen(js_class = YouTubePlayerPlus)]
impl YouTubePlayerPlus {
    /// `element` is a CSS selector or an element; `options` a plain object
    #[wasm_bindgen(constructor)]
    pub fn new(element: JsValue, options: JsValue) -> Result<YouTubePlayerPlus, JsValue> {
        let element_id = resolve_element(&element)?;
        let options: PlayerOptions = if options.is_undefined() || options.is_null() {
            PlayerOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| to_js(Error::InvalidConfig(e.to_string())))?
        };

        let slot: SharedSlot = Rc::new(RefCell::new(Weak::new()));
        let ticker = IntervalTicker::new(slot.clone());
        let player = Player::new(element_id, options, Box::new(ticker)).map_err(to_js)?;
        let events = player.subscribe();

        let shared = Rc::new(Shared {
            player: RefCell::new(player),
            inbox: RefCell::new(VecDeque::new()),
            events: RefCell::new(events),
            listeners: RefCell::new(HashMap::new()),
        });
        *slot.borrow_mut() = Rc::downgrade(&shared);

        let weak = Rc::downgrade(&shared);
        load_iframe_api(move |result| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.deliver(match result {
                Ok(()) => Inbound::ApiLoaded,
                Err(reason) => Inbound::ApiFailed(reason),
            });
        });

        Ok(Self { shared })
    }

    pub fn load(
        &self,
        video_id: String,
        autoplay: Option<bool>,
        start: Option<f64>,
    ) -> Result<(), JsValue> {
        self.shared
            .with_player(|p| p.load(video_id, autoplay.unwrap_or(false), start.unwrap_or(0.0)))
            .map_err(to_js)
    }

    pub fn play(&self) {
        self.shared.with_player(Player::play);
    }

    pub fn pause(&self) {
        self.shared.with_player(Player::pause);
    }

    pub fn stop(&self) {
        self.shared.with_player(Player::stop);
    }

    pub fn seek(&self, seconds: f64) {
        self.shared.with_player(|p| p.seek(seconds));
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) {
        self.shared.with_player(|p| p.set_volume(volume));
    }

    #[wasm_bindgen(js_name = getVolume)]
    pub fn volume(&self) -> u8 {
        self.shared.read(Player::volume)
    }

    pub fn mute(&self) {
        self.shared.with_player(Player::mute);
    }

    #[wasm_bindgen(js_name = unMute)]
    pub fn un_mute(&self) {
        self.shared.with_player(Player::un_mute);
    }

    #[wasm_bindgen(js_name = isMuted)]
    pub fn is_muted(&self) -> bool {
        self.shared.read(Player::is_muted)
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, muted: bool) {
        self.shared.with_player(|p| p.set_muted(muted));
    }

    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&self, width: u32, height: u32) {
        self.shared.with_player(|p| p.set_size(width, height));
    }

    /// `{ width, height }` of the iframe
    #[wasm_bindgen(js_name = getSize)]
    pub fn size(&self) -> Result<JsValue, JsValue> {
        let size = self.shared.read(Player::size);
        serde_wasm_bindgen::to_value(&size).map_err(Into::into)
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) -> Result<(), JsValue> {
        self.shared
            .with_player(|p| p.set_playback_rate(rate))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = getPlaybackRate)]
    pub fn playback_rate(&self) -> f64 {
        self.shared.read(Player::playback_rate)
    }

    #[wasm_bindgen(js_name = getAvailablePlaybackRates)]
    pub fn available_playback_rates(&self) -> Vec<f64> {
        self.shared.read(Player::available_playback_rates)
    }

    #[wasm_bindgen(js_name = setPlaybackQuality)]
    pub fn set_playback_quality(&self, quality: &str) -> Result<(), JsValue> {
        let quality: PlaybackQuality = quality
            .parse()
            .map_err(|e: String| to_js(Error::InvalidConfig(e)))?;
        self.shared.with_player(|p| p.set_playback_quality(quality));
        Ok(())
    }

    #[wasm_bindgen(js_name = getPlaybackQuality)]
    pub fn playback_quality(&self) -> String {
        self.shared.read(|p| p.playback_quality().as_str().to_string())
    }

    #[wasm_bindgen(js_name = getAvailablePlaybackQualities)]
    pub fn available_playback_qualities(&self) -> js_sys::Array {
        self.shared.read(|p| {
            p.available_playback_qualities()
                .iter()
                .map(|q| JsValue::from_str(q.as_str()))
                .collect()
        })
    }

    #[wasm_bindgen(js_name = getDuration)]
    pub fn duration(&self) -> f64 {
        self.shared.read(Player::duration)
    }

    /// Buffered fraction, 0 to 1
    #[wasm_bindgen(js_name = getProgress)]
    pub fn progress(&self) -> f64 {
        self.shared.read(Player::progress)
    }

    /// Name of the widget state, e.g. `"playing"`
    #[wasm_bindgen(js_name = getState)]
    pub fn state(&self) -> String {
        self.shared.read(|p| p.state().name().to_string())
    }

    #[wasm_bindgen(js_name = getCurrentTime)]
    pub fn current_time(&self) -> f64 {
        self.shared.read(Player::current_time)
    }

    #[wasm_bindgen(js_name = getPercentageWatched)]
    pub fn percentage_watched(&self) -> f64 {
        self.shared.read(Player::percentage_watched)
    }

    #[wasm_bindgen(getter, js_name = videoId)]
    pub fn video_id(&self) -> Option<String> {
        self.shared.read(|p| p.video_id().map(str::to_string))
    }

    #[wasm_bindgen(getter)]
    pub fn destroyed(&self) -> bool {
        self.shared.read(Player::is_destroyed)
    }

    pub fn on(&self, event: String, callback: js_sys::Function) {
        self.add_listener(event, callback, false);
    }

    /// Listener removed after its first call
    pub fn once(&self, event: String, callback: js_sys::Function) {
        self.add_listener(event, callback, true);
    }

    pub fn off(&self, event: &str, callback: &js_sys::Function) {
        let target = JsValue::from(callback.clone());
        if let Some(registered) = self.shared.listeners.borrow_mut().get_mut(event) {
            registered.retain(|l| JsValue::from(l.callback.clone()) != target);
        }
    }

    /// Remove the widget and stop the timer. Safe to call more than once.
    pub fn destroy(&self) {
        self.shared.with_player(Player::destroy);
        self.shared.inbox.borrow_mut().clear();
        debug!("YouTubePlayerPlus destroyed");
    }

    fn add_listener(&self, event: String, callback: js_sys::Function, once: bool) {
        self.shared
            .listeners
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(Listener { callback, once });
    }
}
