//! In-process player widget
//!
//! Models enough of the iframe player to drive a [`Player`](crate::Player)
//! without a browser: it records every call it receives, keeps volume, size,
//! rate, quality and position, and raises the callbacks a real widget would
//! raise into a shared outbox the host pumps back into the player.

use crate::{
    backend::{PlayerApi, PlayerBackend, Ticker, WidgetEvent},
    config::EmbedConfig,
    types::{PlaybackQuality, PlayerState, Size, PLAYBACK_RATES},
    Result,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Duration given to every simulated video unless configured otherwise
pub const DEFAULT_VIDEO_DURATION: f64 = 212.0;

type Outbox = Rc<RefCell<VecDeque<WidgetEvent>>>;

/// Simulated iframe API; clones share widgets and outbox
#[derive(Clone)]
pub struct SimulatedApi {
    outbox: Outbox,
    widgets: Rc<RefCell<Vec<SimulatedWidget>>>,
    origin: String,
    video_duration: f64,
}

impl SimulatedApi {
    pub fn new() -> Self {
        Self {
            outbox: Rc::new(RefCell::new(VecDeque::new())),
            widgets: Rc::new(RefCell::new(Vec::new())),
            origin: "http://localhost".to_string(),
            video_duration: DEFAULT_VIDEO_DURATION,
        }
    }

    /// Give every video created from now on this duration
    pub fn with_video_duration(mut self, seconds: f64) -> Self {
        self.video_duration = seconds.max(0.0);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Take the callbacks raised since the last call, oldest first
    pub fn take_events(&self) -> Vec<WidgetEvent> {
        self.outbox.borrow_mut().drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.outbox.borrow().is_empty()
    }

    /// Most recently created widget
    pub fn last_widget(&self) -> Option<SimulatedWidget> {
        self.widgets.borrow().last().cloned()
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.borrow().len()
    }
}

impl Default for SimulatedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerApi for SimulatedApi {
    fn create_player(
        &self,
        element_id: &str,
        config: &EmbedConfig,
    ) -> Result<Box<dyn PlayerBackend>> {
        let widget = SimulatedWidget {
            state: Rc::new(RefCell::new(WidgetState {
                element_id: element_id.to_string(),
                video_id: config.video_id.clone(),
                duration: self.video_duration,
                size: Size::new(config.width, config.height),
                time: config.player_vars.start.map_or(0.0, f64::from),
                ..WidgetState::default()
            })),
            outbox: self.outbox.clone(),
        };
        self.widgets.borrow_mut().push(widget.clone());

        // Real widgets call back asynchronously once the iframe has loaded
        self.outbox.borrow_mut().push_back(WidgetEvent::Ready);
        Ok(Box::new(widget))
    }

    fn origin(&self) -> String {
        self.origin.clone()
    }
}

#[derive(Debug)]
struct WidgetState {
    element_id: String,
    video_id: String,
    state: PlayerState,
    time: f64,
    duration: f64,
    volume: u8,
    muted: bool,
    size: Size,
    rate: f64,
    quality: PlaybackQuality,
    destroyed: bool,
    calls: Vec<String>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            element_id: String::new(),
            video_id: String::new(),
            state: PlayerState::Unstarted,
            time: 0.0,
            duration: DEFAULT_VIDEO_DURATION,
            volume: 100,
            muted: false,
            size: Size::new(640, 360),
            rate: 1.0,
            quality: PlaybackQuality::Default,
            destroyed: false,
            calls: Vec::new(),
        }
    }
}

/// Handle to one simulated widget; clones share state
#[derive(Clone)]
pub struct SimulatedWidget {
    state: Rc<RefCell<WidgetState>>,
    outbox: Outbox,
}

impl SimulatedWidget {
    /// Calls received so far, formatted like `seekTo(30, true)`
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn element_id(&self) -> String {
        self.state.borrow().element_id.clone()
    }

    pub fn loaded_video(&self) -> String {
        self.state.borrow().video_id.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Raise an arbitrary callback, e.g. an error code
    pub fn raise(&self, event: WidgetEvent) {
        if !self.state.borrow().destroyed {
            self.outbox.borrow_mut().push_back(event);
        }
    }

    /// Advance the clock; a playing video moves forward and may end
    pub fn advance(&self, elapsed: Duration) {
        let ended = {
            let mut s = self.state.borrow_mut();
            if s.destroyed || s.state != PlayerState::Playing {
                return;
            }
            s.time += elapsed.as_secs_f64() * s.rate;
            if s.time >= s.duration {
                s.time = s.duration;
                s.state = PlayerState::Ended;
                true
            } else {
                false
            }
        };
        if ended {
            self.raise(WidgetEvent::StateChange(PlayerState::Ended.code()));
        }
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn transition(&self, state: PlayerState) {
        self.state.borrow_mut().state = state;
        self.raise(WidgetEvent::StateChange(state.code()));
    }
}

impl PlayerBackend for SimulatedWidget {
    fn play_video(&mut self) {
        self.record("playVideo()".into());
        self.transition(PlayerState::Playing);
    }

    fn pause_video(&mut self) {
        self.record("pauseVideo()".into());
        self.transition(PlayerState::Paused);
    }

    fn stop_video(&mut self) {
        self.record("stopVideo()".into());
        self.state.borrow_mut().time = 0.0;
        self.transition(PlayerState::Cued);
    }

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
        self.record(format!("seekTo({seconds}, {allow_seek_ahead})"));
        let mut s = self.state.borrow_mut();
        s.time = seconds.clamp(0.0, s.duration);
    }

    fn load_video_by_id(&mut self, video_id: &str, start_seconds: f64) {
        self.record(format!("loadVideoById({video_id}, {start_seconds})"));
        {
            let mut s = self.state.borrow_mut();
            s.video_id = video_id.to_string();
            s.time = start_seconds.clamp(0.0, s.duration);
        }
        self.transition(PlayerState::Buffering);
        self.transition(PlayerState::Playing);
    }

    fn cue_video_by_id(&mut self, video_id: &str, start_seconds: f64) {
        self.record(format!("cueVideoById({video_id}, {start_seconds})"));
        {
            let mut s = self.state.borrow_mut();
            s.video_id = video_id.to_string();
            s.time = start_seconds.clamp(0.0, s.duration);
        }
        self.transition(PlayerState::Cued);
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(format!("setVolume({volume})"));
        self.state.borrow_mut().volume = volume.min(100);
    }

    fn volume(&self) -> u8 {
        self.state.borrow().volume
    }

    fn mute(&mut self) {
        self.record("mute()".into());
        self.state.borrow_mut().muted = true;
    }

    fn un_mute(&mut self) {
        self.record("unMute()".into());
        self.state.borrow_mut().muted = false;
    }

    fn is_muted(&self) -> bool {
        self.state.borrow().muted
    }

    fn set_size(&mut self, size: Size) {
        self.record(format!("setSize({}, {})", size.width, size.height));
        self.state.borrow_mut().size = size;
    }

    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.record(format!("setPlaybackRate({rate})"));
        let changed = {
            let mut s = self.state.borrow_mut();
            let changed = (s.rate - rate).abs() > f64::EPSILON;
            s.rate = rate;
            changed
        };
        if changed {
            self.raise(WidgetEvent::PlaybackRateChange(rate));
        }
    }

    fn playback_rate(&self) -> f64 {
        self.state.borrow().rate
    }

    fn available_playback_rates(&self) -> Vec<f64> {
        PLAYBACK_RATES.to_vec()
    }

    fn set_playback_quality(&mut self, quality: PlaybackQuality) {
        self.record(format!("setPlaybackQuality({quality})"));
        let changed = {
            let mut s = self.state.borrow_mut();
            let changed = s.quality != quality;
            s.quality = quality;
            changed
        };
        if changed {
            self.raise(WidgetEvent::PlaybackQualityChange(quality));
        }
    }

    fn playback_quality(&self) -> PlaybackQuality {
        self.state.borrow().quality
    }

    fn available_quality_levels(&self) -> Vec<PlaybackQuality> {
        vec![
            PlaybackQuality::Hd1080,
            PlaybackQuality::Hd720,
            PlaybackQuality::Large,
            PlaybackQuality::Medium,
            PlaybackQuality::Small,
        ]
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().time
    }

    fn video_loaded_fraction(&self) -> f64 {
        let s = self.state.borrow();
        if s.duration > 0.0 {
            // Pretend roughly thirty seconds are buffered ahead of the playhead
            ((s.time + 30.0) / s.duration).min(1.0)
        } else {
            0.0
        }
    }

    fn player_state(&self) -> i32 {
        self.state.borrow().state.code()
    }

    fn destroy(&mut self) {
        self.record("destroy()".into());
        self.state.borrow_mut().destroyed = true;
    }
}

/// Ticker the host advances by hand; clones share state
#[derive(Clone, Debug, Default)]
pub struct ManualTicker {
    inner: Rc<RefCell<TickerState>>,
}

#[derive(Debug, Default)]
struct TickerState {
    period: Option<Duration>,
    starts: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period while running
    pub fn period(&self) -> Option<Duration> {
        self.inner.borrow().period
    }

    /// Number of times the ticker was started
    pub fn start_count(&self) -> usize {
        self.inner.borrow().starts
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, period: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.period = Some(period);
        inner.starts += 1;
    }

    fn stop(&mut self) {
        self.inner.borrow_mut().period = None;
    }

    fn is_running(&self) -> bool {
        self.inner.borrow().period.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerOptions;

    fn widget(api: &SimulatedApi) -> Box<dyn PlayerBackend> {
        let config = PlayerOptions::default().embed_config("abc", "http://localhost");
        api.create_player("app", &config).unwrap()
    }

    #[test]
    fn test_creation_schedules_ready() {
        let api = SimulatedApi::new();
        let _widget = widget(&api);
        assert_eq!(api.take_events(), vec![WidgetEvent::Ready]);
        assert!(!api.has_pending_events());
        assert_eq!(api.last_widget().unwrap().element_id(), "app");
    }

    #[test]
    fn test_playback_advances_and_ends() {
        let api = SimulatedApi::new().with_video_duration(10.0);
        let mut widget = widget(&api);
        let handle = api.last_widget().unwrap();
        api.take_events();

        widget.play_video();
        handle.advance(Duration::from_secs(4));
        assert_eq!(widget.current_time(), 4.0);

        handle.advance(Duration::from_secs(20));
        assert_eq!(widget.current_time(), 10.0);
        assert_eq!(widget.player_state(), PlayerState::Ended.code());
        assert_eq!(
            api.take_events(),
            vec![WidgetEvent::StateChange(1), WidgetEvent::StateChange(0)]
        );
    }

    #[test]
    fn test_destroyed_widget_is_silent() {
        let api = SimulatedApi::new();
        let mut widget = widget(&api);
        api.take_events();
        widget.destroy();
        widget.play_video();
        assert!(api.take_events().is_empty());
        assert!(api.last_widget().unwrap().is_destroyed());
    }

    #[test]
    fn test_manual_ticker() {
        let mut ticker = ManualTicker::new();
        let handle = ticker.clone();
        ticker.start(Duration::from_millis(250));
        assert!(handle.is_running());
        assert_eq!(handle.period(), Some(Duration::from_millis(250)));
        ticker.stop();
        assert!(!handle.is_running());
        assert_eq!(handle.start_count(), 1);
    }
}
