//! Player facade - mediates between callers and the embedded widget
//!
//! Coordinates:
//! - Deferring commands until the widget is ready
//! - Re-issuing the last requested load once the API or widget becomes available
//! - Translating widget state codes into named events
//! - Synthesizing time updates while a video plays

use crate::{
    backend::{PlayerApi, PlayerBackend, Ticker, WidgetEvent},
    command::{Command, CommandQueue},
    config::PlayerOptions,
    events::{EventBus, PlayerEvent},
    types::*,
    Error, Result,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Facade over one embedded player widget
pub struct Player {
    /// Id of the host element the widget replaces
    element_id: Option<String>,
    /// Player options
    options: PlayerOptions,
    /// Loaded iframe API, once available
    api: Option<Box<dyn PlayerApi>>,
    /// Widget instance, once created
    widget: Option<Box<dyn PlayerBackend>>,
    /// Time update timer
    ticker: Box<dyn Ticker>,
    /// Set on the widget's ready callback
    ready: bool,
    /// Last requested load
    request: Option<VideoRequest>,
    /// Commands issued before the widget was ready
    queue: CommandQueue,
    /// Set by teardown
    destroyed: bool,
    /// Event fan-out
    events: EventBus,
}

impl Player {
    /// Create a player for the host element with the given id
    pub fn new(
        element_id: impl Into<String>,
        options: PlayerOptions,
        ticker: Box<dyn Ticker>,
    ) -> Result<Self> {
        let element_id = element_id.into();
        if element_id.trim().is_empty() {
            return Err(Error::ElementNotFound(element_id));
        }
        options.validate()?;

        debug!(element_id = %element_id, "Player created");

        Ok(Self {
            element_id: Some(element_id),
            options,
            api: None,
            widget: None,
            ticker,
            ready: false,
            request: None,
            queue: CommandQueue::new(),
            destroyed: false,
            events: EventBus::default(),
        })
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Event bus the player publishes on
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// The video most recently passed to [`load`](Self::load)
    pub fn video_id(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.video_id.as_str())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    pub fn has_widget(&self) -> bool {
        self.widget.is_some()
    }

    /// Commands waiting for the ready transition
    pub fn pending_commands(&self) -> Vec<Command> {
        self.queue.iter().cloned().collect()
    }

    // ------------------------------------------------------------------
    // API availability
    // ------------------------------------------------------------------

    /// The iframe API finished loading
    pub fn api_loaded(&mut self, api: Box<dyn PlayerApi>) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        info!("Iframe API available");
        self.api = Some(api);

        // A load requested before the API arrived runs now
        self.issue_load()
    }

    /// The iframe API could not be loaded
    pub fn api_failed(&mut self, reason: impl Into<String>) {
        self.teardown(Some(Error::ApiLoadFailed(reason.into())));
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load a video; the last call made before the widget is ready wins
    pub fn load(&mut self, video_id: impl Into<String>, autoplay: bool, start: f64) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let request = VideoRequest::new(video_id, autoplay, start.max(0.0));
        debug!(video_id = %request.video_id, autoplay, start = request.start, "Load requested");
        self.request = Some(request);
        self.issue_load()
    }

    fn issue_load(&mut self) -> Result<()> {
        let Some(request) = self.request.clone() else {
            return Ok(());
        };

        let Some(api) = self.api.as_ref() else {
            debug!("Iframe API not loaded yet, deferring load");
            return Ok(());
        };

        let Some(widget) = self.widget.as_mut() else {
            let Some(element_id) = self.element_id.as_deref() else {
                return Ok(());
            };
            let embed = self.options.embed_config(&request.video_id, &api.origin());
            info!(element_id, video_id = %request.video_id, "Creating widget");
            self.widget = Some(api.create_player(element_id, &embed)?);
            return Ok(());
        };

        if !self.ready {
            debug!("Widget not ready yet, deferring load");
            return Ok(());
        }

        if request.autoplay {
            widget.load_video_by_id(&request.video_id, request.start);
        } else {
            widget.cue_video_by_id(&request.video_id, request.start);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn play(&mut self) {
        self.dispatch(Command::Play);
    }

    pub fn pause(&mut self) {
        self.dispatch(Command::Pause);
    }

    pub fn stop(&mut self) {
        self.dispatch(Command::Stop);
    }

    /// Seek to a position in seconds
    pub fn seek(&mut self, seconds: f64) {
        self.dispatch(Command::Seek(seconds.max(0.0)));
    }

    /// Set the volume, clamped to 0-100
    pub fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 100.0).round() as u8;
        self.dispatch(Command::SetVolume(volume));
    }

    pub fn mute(&mut self) {
        self.dispatch(Command::Mute);
    }

    pub fn un_mute(&mut self) {
        self.dispatch(Command::UnMute);
    }

    pub fn set_muted(&mut self, muted: bool) {
        if muted {
            self.mute();
        } else {
            self.un_mute();
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.dispatch(Command::SetSize(Size::new(width, height)));
    }

    /// Set the playback rate; only [`PLAYBACK_RATES`] are accepted
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !is_supported_rate(rate) {
            return Err(Error::InvalidPlaybackRate(rate));
        }
        self.dispatch(Command::SetPlaybackRate(rate));
        Ok(())
    }

    pub fn set_playback_quality(&mut self, quality: PlaybackQuality) {
        self.dispatch(Command::SetPlaybackQuality(quality));
    }

    /// Apply a command now, or queue it until the widget is ready
    pub fn dispatch(&mut self, command: Command) {
        if self.destroyed {
            debug!(command = %command, "Dropping command on destroyed player");
            return;
        }

        if self.ready {
            if let Some(widget) = self.widget.as_deref_mut() {
                apply(widget, &command);
                return;
            }
        }

        debug!(command = %command, queued = self.queue.len() + 1, "Queueing command until ready");
        self.queue.push(command);
    }

    fn flush_queue(&mut self) {
        let commands = self.queue.drain();
        if !commands.is_empty() {
            debug!(count = commands.len(), "Replaying queued commands");
        }
        for command in commands {
            self.dispatch(command);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn ready_widget(&self) -> Option<&dyn PlayerBackend> {
        if self.ready {
            self.widget.as_deref()
        } else {
            None
        }
    }

    pub fn volume(&self) -> u8 {
        self.ready_widget().map_or(0, |w| w.volume())
    }

    pub fn is_muted(&self) -> bool {
        self.ready_widget().is_some_and(|w| w.is_muted())
    }

    pub fn size(&self) -> Size {
        self.ready_widget().map(|w| w.size()).unwrap_or_default()
    }

    pub fn playback_rate(&self) -> f64 {
        self.ready_widget().map_or(1.0, |w| w.playback_rate())
    }

    pub fn available_playback_rates(&self) -> Vec<f64> {
        self.ready_widget()
            .map_or_else(|| vec![1.0], |w| w.available_playback_rates())
    }

    pub fn playback_quality(&self) -> PlaybackQuality {
        self.ready_widget()
            .map(|w| w.playback_quality())
            .unwrap_or_default()
    }

    pub fn available_playback_qualities(&self) -> Vec<PlaybackQuality> {
        self.ready_widget()
            .map(|w| w.available_quality_levels())
            .unwrap_or_default()
    }

    /// Video duration in seconds
    pub fn duration(&self) -> f64 {
        self.ready_widget().map_or(0.0, |w| w.duration())
    }

    /// Fraction of the video buffered
    pub fn progress(&self) -> f64 {
        self.ready_widget().map_or(0.0, |w| w.video_loaded_fraction())
    }

    pub fn state(&self) -> PlayerState {
        self.ready_widget()
            .and_then(|w| PlayerState::from_code(w.player_state()))
            .unwrap_or(PlayerState::Unstarted)
    }

    /// Playback position in seconds
    pub fn current_time(&self) -> f64 {
        self.ready_widget().map_or(0.0, |w| w.current_time())
    }

    /// Fraction of the video played, 0.0 when the duration is unknown
    pub fn percentage_watched(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.current_time() / duration
        } else {
            0.0
        }
    }

    // ------------------------------------------------------------------
    // Widget callbacks
    // ------------------------------------------------------------------

    /// Feed a widget callback into the player
    pub fn handle_widget_event(&mut self, event: WidgetEvent) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }

        match event {
            WidgetEvent::Ready => self.on_ready(),
            WidgetEvent::StateChange(code) => self.on_state_change(code),
            WidgetEvent::PlaybackQualityChange(quality) => {
                self.events.publish(PlayerEvent::PlaybackQualityChange(quality));
                Ok(())
            }
            WidgetEvent::PlaybackRateChange(rate) => {
                self.events.publish(PlayerEvent::PlaybackRateChange(rate));
                Ok(())
            }
            WidgetEvent::Error(code) => {
                self.on_error(code);
                Ok(())
            }
        }
    }

    fn on_ready(&mut self) -> Result<()> {
        info!(queued = self.queue.len(), "Player ready");
        self.events.publish(PlayerEvent::Ready);
        self.ready = true;

        // The widget may have been created for an older video, or the caller
        // asked for autoplay; re-issuing the last load covers both.
        self.issue_load()?;
        self.flush_queue();
        Ok(())
    }

    fn on_state_change(&mut self, code: i32) -> Result<()> {
        let state = PlayerState::from_code(code).ok_or(Error::UnrecognizedState(code))?;

        if self.options.debug {
            info!(%state, "State changed");
        } else {
            debug!(%state, "State changed");
        }

        // No time update may follow a halt until playback resumes
        if state.is_halted() {
            self.time_update();
        }

        self.events.publish(PlayerEvent::for_state(state));
        self.events.publish(PlayerEvent::StateChange(state));

        match state {
            PlayerState::Playing => self.ticker.start(self.options.time_update_interval()),
            PlayerState::Cued => {}
            _ => self.ticker.stop(),
        }

        // A new or starting video resets the reported time, never before the state event
        if state.resets_time() {
            self.time_update();
        }
        Ok(())
    }

    fn on_error(&mut self, code: i32) {
        match WidgetErrorCode::from_code(code) {
            Some(error @ WidgetErrorCode::Html5Error) => {
                // Reported for transient playback hiccups; the player recovers on its own
                warn!(code, "{}", error.explain());
            }
            Some(error) => {
                let video_id = self.video_id().unwrap_or_default().to_string();
                warn!(code, video_id = %video_id, "{}", error.explain());
                self.events.publish(PlayerEvent::Unplayable(video_id));
            }
            None => self.teardown(Some(Error::UnknownErrorCode(code))),
        }
    }

    /// Called once per ticker period
    pub fn tick(&mut self) {
        if self.destroyed {
            return;
        }
        self.time_update();
    }

    fn time_update(&self) {
        self.events.publish(PlayerEvent::TimeUpdate(self.current_time()));
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Destroy the widget and drop all pending state; safe to call repeatedly
    pub fn destroy(&mut self) {
        self.teardown(None);
    }

    fn teardown(&mut self, error: Option<Error>) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        match &error {
            Some(e) => warn!(error = %e, "Destroying player"),
            None => info!("Destroying player"),
        }

        if let Some(mut widget) = self.widget.take() {
            widget.stop_video();
            widget.destroy();
        }

        self.request = None;
        self.element_id = None;
        self.api = None;
        self.ready = false;
        self.queue.clear();
        self.ticker.stop();

        if let Some(e) = error {
            self.events.publish(PlayerEvent::from_error(&e));
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.teardown(None);
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("element_id", &self.element_id)
            .field("request", &self.request)
            .field("ready", &self.ready)
            .field("queued", &self.queue.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

fn apply(widget: &mut dyn PlayerBackend, command: &Command) {
    match command {
        Command::Play => widget.play_video(),
        Command::Pause => widget.pause_video(),
        Command::Stop => widget.stop_video(),
        Command::Seek(seconds) => widget.seek_to(*seconds, true),
        Command::SetVolume(volume) => widget.set_volume(*volume),
        Command::Mute => widget.mute(),
        Command::UnMute => widget.un_mute(),
        Command::SetSize(size) => widget.set_size(*size),
        Command::SetPlaybackRate(rate) => widget.set_playback_rate(*rate),
        Command::SetPlaybackQuality(quality) => widget.set_playback_quality(*quality),
    }
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::sim::{ManualTicker, SimulatedApi};

    fn drain(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn player() -> (Player, ManualTicker) {
        let ticker = ManualTicker::new();
        let player =
            Player::new("app", PlayerOptions::default(), Box::new(ticker.clone())).unwrap();
        (player, ticker)
    }

    #[test]
    fn test_player_creation() {
        let (player, _) = player();
        assert!(!player.is_ready());
        assert!(!player.is_destroyed());
        assert_eq!(player.state(), PlayerState::Unstarted);
        assert_eq!(player.current_time(), 0.0);
        assert!(player.pending_commands().is_empty());
    }

    #[test]
    fn test_empty_element_rejected() {
        let err = Player::new(" ", PlayerOptions::default(), Box::new(ManualTicker::new()));
        assert!(matches!(err, Err(Error::ElementNotFound(_))));
    }

    #[test]
    fn test_neutral_queries_before_ready() {
        let (player, _) = player();
        assert_eq!(player.volume(), 0);
        assert!(!player.is_muted());
        assert_eq!(player.size(), Size::default());
        assert_eq!(player.playback_rate(), 1.0);
        assert_eq!(player.available_playback_rates(), vec![1.0]);
        assert_eq!(player.playback_quality(), PlaybackQuality::Default);
        assert!(player.available_playback_qualities().is_empty());
        assert_eq!(player.percentage_watched(), 0.0);
    }

    #[test]
    fn test_commands_queue_until_ready() {
        let (mut player, _) = player();
        let api = SimulatedApi::new();
        player.load("first", false, 0.0).unwrap();
        player.set_volume(150.0);
        player.play();

        assert_eq!(
            player.pending_commands(),
            vec![Command::SetVolume(100), Command::Play]
        );

        player.api_loaded(Box::new(api.clone())).unwrap();
        assert!(player.has_widget());
        let widget = api.last_widget().unwrap();
        assert!(widget.calls().is_empty());

        player.handle_widget_event(WidgetEvent::Ready).unwrap();
        assert!(player.pending_commands().is_empty());
        assert_eq!(
            widget.calls(),
            vec!["cueVideoById(first, 0)", "setVolume(100)", "playVideo()"]
        );
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let (mut player, _) = player();
        assert!(matches!(
            player.set_playback_rate(3.0),
            Err(Error::InvalidPlaybackRate(_))
        ));
        assert!(player.pending_commands().is_empty());
        player.set_playback_rate(0.5).unwrap();
        assert_eq!(player.pending_commands(), vec![Command::SetPlaybackRate(0.5)]);
    }

    #[test]
    fn test_unrecognized_state() {
        let (mut player, _) = player();
        let mut rx = player.subscribe();
        let result = player.handle_widget_event(WidgetEvent::StateChange(4));
        assert!(matches!(result, Err(Error::UnrecognizedState(4))));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_state_events_order() {
        let (mut player, ticker) = player();
        let mut rx = player.subscribe();

        player.handle_widget_event(WidgetEvent::StateChange(2)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                PlayerEvent::TimeUpdate(0.0),
                PlayerEvent::Paused,
                PlayerEvent::StateChange(PlayerState::Paused),
            ]
        );

        player.handle_widget_event(WidgetEvent::StateChange(1)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                PlayerEvent::Playing,
                PlayerEvent::StateChange(PlayerState::Playing),
                PlayerEvent::TimeUpdate(0.0),
            ]
        );
        assert!(ticker.is_running());

        player.handle_widget_event(WidgetEvent::StateChange(5)).unwrap();
        assert!(ticker.is_running());
        player.handle_widget_event(WidgetEvent::StateChange(3)).unwrap();
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_unstarted_and_cued_report_time_after_state() {
        let (mut player, ticker) = player();
        let mut rx = player.subscribe();

        player.handle_widget_event(WidgetEvent::StateChange(1)).unwrap();
        drain(&mut rx);

        player.handle_widget_event(WidgetEvent::StateChange(-1)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                PlayerEvent::Unstarted,
                PlayerEvent::StateChange(PlayerState::Unstarted),
                PlayerEvent::TimeUpdate(0.0),
            ]
        );
        assert!(!ticker.is_running());

        player.handle_widget_event(WidgetEvent::StateChange(5)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                PlayerEvent::Cued,
                PlayerEvent::StateChange(PlayerState::Cued),
                PlayerEvent::TimeUpdate(0.0),
            ]
        );
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_repeated_playing_restarts_ticker() {
        let (mut player, ticker) = player();
        player.handle_widget_event(WidgetEvent::StateChange(1)).unwrap();
        player.handle_widget_event(WidgetEvent::StateChange(1)).unwrap();

        assert_eq!(ticker.start_count(), 2);
        assert_eq!(ticker.period(), Some(crate::config::MIN_TIME_UPDATE_INTERVAL));
    }

    #[test]
    fn test_set_muted_queues_and_replays() {
        let (mut player, _) = player();
        let api = SimulatedApi::new();
        player.set_muted(true);
        player.set_muted(false);
        player.set_muted(true);
        assert_eq!(
            player.pending_commands(),
            vec![Command::Mute, Command::UnMute, Command::Mute]
        );

        player.load("vid", false, 0.0).unwrap();
        player.api_loaded(Box::new(api.clone())).unwrap();
        player.handle_widget_event(WidgetEvent::Ready).unwrap();

        let widget = api.last_widget().unwrap();
        assert_eq!(
            widget.calls(),
            vec!["cueVideoById(vid, 0)", "mute()", "unMute()", "mute()"]
        );
        assert!(player.is_muted());

        player.set_muted(false);
        assert!(!player.is_muted());
    }

    #[test]
    fn test_html5_error_ignored() {
        let (mut player, _) = player();
        let mut rx = player.subscribe();
        player.handle_widget_event(WidgetEvent::Error(5)).unwrap();
        assert!(drain(&mut rx).is_empty());
        assert!(!player.is_destroyed());
    }

    #[test]
    fn test_unplayable_reports_video() {
        let (mut player, _) = player();
        let mut rx = player.subscribe();
        player.load("gone", false, 0.0).unwrap();
        player.handle_widget_event(WidgetEvent::Error(150)).unwrap();
        assert_eq!(drain(&mut rx), vec![PlayerEvent::Unplayable("gone".into())]);
        assert!(!player.is_destroyed());
    }

    #[test]
    fn test_unknown_error_destroys() {
        let (mut player, ticker) = player();
        let mut rx = player.subscribe();
        player.play();
        player.handle_widget_event(WidgetEvent::Error(42)).unwrap();

        assert!(player.is_destroyed());
        assert!(player.pending_commands().is_empty());
        assert!(!ticker.is_running());
        assert_eq!(
            drain(&mut rx),
            vec![PlayerEvent::Error {
                code: "UNKNOWN_ERROR_CODE".into(),
                message: "Unknown error code: 42".into(),
            }]
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mut player, _) = player();
        let api = SimulatedApi::new();
        player.api_loaded(Box::new(api.clone())).unwrap();
        player.load("vid", false, 0.0).unwrap();
        let widget = api.last_widget().unwrap();

        player.destroy();
        player.destroy();

        assert!(player.is_destroyed());
        assert!(!player.has_widget());
        assert!(!player.has_api());
        assert_eq!(player.video_id(), None);
        assert_eq!(player.element_id(), None);
        assert_eq!(widget.calls(), vec!["stopVideo()", "destroy()"]);
    }

    #[test]
    fn test_tick_publishes_time() {
        let (mut player, _) = player();
        let mut rx = player.subscribe();
        player.tick();
        player.destroy();
        player.tick();
        assert_eq!(drain(&mut rx), vec![PlayerEvent::TimeUpdate(0.0)]);
    }
}
