//! Integration tests for ytplus Core

use std::time::Duration;

use tokio::sync::broadcast;
use ytplus_core::{
    sim::{ManualTicker, SimulatedApi},
    Command, Error, PlaybackQuality, Player, PlayerEvent, PlayerOptions, PlayerState, Size,
    Ticker, WidgetEvent,
};

// =============================================================================
// Helpers
// =============================================================================

fn new_player(options: PlayerOptions) -> (Player, ManualTicker) {
    let ticker = ManualTicker::new();
    let player = Player::new("app", options, Box::new(ticker.clone())).unwrap();
    (player, ticker)
}

/// Feed widget callbacks back into the player until the widget goes quiet
fn pump(player: &mut Player, api: &SimulatedApi) {
    while api.has_pending_events() {
        for event in api.take_events() {
            player.handle_widget_event(event).unwrap();
        }
    }
}

fn drain(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn names(events: &[PlayerEvent]) -> Vec<&'static str> {
    events.iter().map(PlayerEvent::name).collect()
}

/// Player with the API loaded and the widget ready, playing `vid`
fn playing_player(options: PlayerOptions, api: &SimulatedApi) -> (Player, ManualTicker) {
    let (mut player, ticker) = new_player(options);
    player.load("vid", true, 0.0).unwrap();
    player.api_loaded(Box::new(api.clone())).unwrap();
    pump(&mut player, api);
    assert!(player.is_ready());
    (player, ticker)
}

// =============================================================================
// Readiness and replay
// =============================================================================

#[test]
fn test_full_lifecycle_replays_load_then_queue() {
    let (mut player, ticker) = new_player(PlayerOptions::default());
    let mut rx = player.subscribe();
    let api = SimulatedApi::new();

    player.load("KGQdWaD6XHM", true, 10.0).unwrap();
    player.set_volume(40.0);
    player.mute();
    player.play();
    assert_eq!(
        player.pending_commands(),
        vec![Command::SetVolume(40), Command::Mute, Command::Play]
    );

    player.api_loaded(Box::new(api.clone())).unwrap();
    let widget = api.last_widget().unwrap();
    assert_eq!(widget.element_id(), "app");
    assert!(!player.is_ready());

    pump(&mut player, &api);

    assert_eq!(
        widget.calls(),
        vec![
            "loadVideoById(KGQdWaD6XHM, 10)",
            "setVolume(40)",
            "mute()",
            "playVideo()",
        ]
    );
    assert!(player.pending_commands().is_empty());
    assert_eq!(
        names(&drain(&mut rx)),
        vec![
            "ready",
            "timeupdate",
            "buffering",
            "stateChange",
            "playing",
            "stateChange",
            "timeupdate",
            "playing",
            "stateChange",
            "timeupdate",
        ]
    );

    assert_eq!(player.volume(), 40);
    assert!(player.is_muted());
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(player.current_time(), 10.0);
    assert!(ticker.is_running());
}

#[test]
fn test_last_load_before_api_wins() {
    let (mut player, _) = new_player(PlayerOptions::default());
    let api = SimulatedApi::new();

    player.load("first", false, 0.0).unwrap();
    player.load("second", false, 0.0).unwrap();
    player.api_loaded(Box::new(api.clone())).unwrap();

    assert_eq!(api.widget_count(), 1);
    assert_eq!(api.last_widget().unwrap().loaded_video(), "second");
}

#[test]
fn test_last_load_before_ready_wins() {
    let (mut player, _) = new_player(PlayerOptions::default());
    let api = SimulatedApi::new();

    player.api_loaded(Box::new(api.clone())).unwrap();
    player.load("first", false, 0.0).unwrap();
    player.load("second", false, 5.0).unwrap();

    let widget = api.last_widget().unwrap();
    assert_eq!(widget.loaded_video(), "first");

    pump(&mut player, &api);

    assert_eq!(api.widget_count(), 1);
    assert_eq!(widget.calls(), vec!["cueVideoById(second, 5)"]);
    assert_eq!(widget.loaded_video(), "second");
    assert_eq!(player.video_id(), Some("second"));
    assert_eq!(player.state(), PlayerState::Cued);
}

#[test]
fn test_load_after_ready_cues_or_loads() {
    let api = SimulatedApi::new();
    let (mut player, _) = playing_player(PlayerOptions::default(), &api);
    let widget = api.last_widget().unwrap();

    player.load("cued", false, 3.0).unwrap();
    player.load("autoplayed", true, 0.0).unwrap();

    assert_eq!(
        widget.calls(),
        vec![
            "loadVideoById(vid, 0)",
            "cueVideoById(cued, 3)",
            "loadVideoById(autoplayed, 0)",
        ]
    );
}

#[test]
fn test_queue_drains_exactly_once() {
    let (mut player, _) = new_player(PlayerOptions::default());
    let api = SimulatedApi::new();

    player.seek(30.0);
    player.set_size(800, 450);
    player.load("vid", false, 0.0).unwrap();
    player.api_loaded(Box::new(api.clone())).unwrap();
    pump(&mut player, &api);

    let widget = api.last_widget().unwrap();
    assert_eq!(
        widget.calls(),
        vec!["cueVideoById(vid, 0)", "seekTo(30, true)", "setSize(800, 450)"]
    );

    // A second ready callback has nothing left to replay
    player.handle_widget_event(WidgetEvent::Ready).unwrap();
    assert_eq!(widget.calls().iter().filter(|c| c.starts_with("seekTo")).count(), 1);

    // After readiness commands go straight to the widget
    player.pause();
    assert!(player.pending_commands().is_empty());
    assert_eq!(widget.calls().last().map(String::as_str), Some("pauseVideo()"));
    assert_eq!(player.size(), Size::new(800, 450));
}

// =============================================================================
// Time updates
// =============================================================================

#[test]
fn test_ticker_follows_playback() {
    let options = PlayerOptions {
        time_update_frequency: 250,
        ..Default::default()
    };
    let api = SimulatedApi::new();
    let (mut player, ticker) = playing_player(options, &api);
    let widget = api.last_widget().unwrap();
    let mut rx = player.subscribe();

    assert_eq!(ticker.period(), Some(Duration::from_millis(250)));

    widget.advance(Duration::from_millis(250));
    player.tick();
    widget.advance(Duration::from_millis(250));
    player.tick();
    assert_eq!(
        drain(&mut rx),
        vec![PlayerEvent::TimeUpdate(0.25), PlayerEvent::TimeUpdate(0.5)]
    );

    player.pause();
    pump(&mut player, &api);
    assert!(!ticker.is_running());
    assert_eq!(
        drain(&mut rx),
        vec![
            PlayerEvent::TimeUpdate(0.5),
            PlayerEvent::Paused,
            PlayerEvent::StateChange(PlayerState::Paused),
        ]
    );
}

#[test]
fn test_video_end_stops_ticker() {
    let api = SimulatedApi::new().with_video_duration(1.0);
    let (mut player, ticker) = playing_player(PlayerOptions::default(), &api);
    let mut rx = player.subscribe();

    api.last_widget().unwrap().advance(Duration::from_secs(2));
    pump(&mut player, &api);

    assert!(!ticker.is_running());
    assert_eq!(
        drain(&mut rx),
        vec![
            PlayerEvent::TimeUpdate(1.0),
            PlayerEvent::Ended,
            PlayerEvent::StateChange(PlayerState::Ended),
        ]
    );
    assert_eq!(player.percentage_watched(), 1.0);
}

// =============================================================================
// Widget events
// =============================================================================

#[test]
fn test_rate_and_quality_changes_republished() {
    let api = SimulatedApi::new();
    let (mut player, _) = playing_player(PlayerOptions::default(), &api);
    let mut rx = player.subscribe();

    player.set_playback_rate(1.5).unwrap();
    player.set_playback_quality(PlaybackQuality::Hd720);
    pump(&mut player, &api);

    assert_eq!(
        drain(&mut rx),
        vec![
            PlayerEvent::PlaybackRateChange(1.5),
            PlayerEvent::PlaybackQualityChange(PlaybackQuality::Hd720),
        ]
    );
    assert_eq!(player.playback_rate(), 1.5);
    assert_eq!(player.playback_quality(), PlaybackQuality::Hd720);
    assert_eq!(player.available_playback_rates().len(), 5);
}

#[test]
fn test_unplayable_video_keeps_player() {
    let api = SimulatedApi::new();
    let (mut player, _) = playing_player(PlayerOptions::default(), &api);
    let mut rx = player.subscribe();

    api.last_widget().unwrap().raise(WidgetEvent::Error(101));
    pump(&mut player, &api);

    assert_eq!(drain(&mut rx), vec![PlayerEvent::Unplayable("vid".into())]);
    assert!(player.is_ready());

    player.load("other", true, 0.0).unwrap();
    assert_eq!(api.last_widget().unwrap().loaded_video(), "other");
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_api_failure_tears_down() {
    let (mut player, _) = new_player(PlayerOptions::default());
    let mut rx = player.subscribe();

    player.load("vid", true, 0.0).unwrap();
    player.play();
    player.api_failed("script blocked");

    assert!(player.is_destroyed());
    assert!(player.pending_commands().is_empty());
    assert_eq!(player.video_id(), None);
    assert_eq!(
        drain(&mut rx),
        vec![PlayerEvent::Error {
            code: "FAILED_TO_LOAD".into(),
            message: "YouTube Iframe API failed to load: script blocked".into(),
        }]
    );

    // Everything after teardown is a no-op
    player.load("again", true, 0.0).unwrap();
    player.play();
    assert_eq!(player.video_id(), None);
    assert!(player.pending_commands().is_empty());
}

#[test]
fn test_callbacks_after_destroy_are_ignored() {
    let (mut player, ticker) = new_player(PlayerOptions::default());
    let api = SimulatedApi::new();
    let mut rx = player.subscribe();

    player.load("vid", false, 0.0).unwrap();
    player.api_loaded(Box::new(api.clone())).unwrap();
    player.destroy();
    pump(&mut player, &api);
    player.tick();

    assert!(!player.is_ready());
    assert!(!ticker.is_running());
    assert!(api.last_widget().unwrap().is_destroyed());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_drop_destroys_widget() {
    let api = SimulatedApi::new();
    let (player, _) = playing_player(PlayerOptions::default(), &api);
    let widget = api.last_widget().unwrap();
    drop(player);
    assert!(widget.is_destroyed());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_widget_built_from_options() {
    let options = PlayerOptions {
        width: 1280,
        height: 720,
        ..Default::default()
    };
    let api = SimulatedApi::new();
    let (player, _) = playing_player(options, &api);
    assert_eq!(player.size(), Size::new(1280, 720));
    assert!(player.duration() > 0.0);
    assert!(player.progress() > 0.0);
}

#[test]
fn test_invalid_options_rejected() {
    let options = PlayerOptions {
        host: "not a url".into(),
        ..Default::default()
    };
    let result = Player::new("app", options, Box::new(ManualTicker::new()));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
