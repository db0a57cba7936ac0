//! CLI command implementations

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use url::Url;
use ytplus_core::sim::{ManualTicker, SimulatedApi};
use ytplus_core::{
    is_supported_rate, Command, PlaybackQuality, Player, PlayerEvent, PlayerOptions, PlayerState,
    Size, Ticker, WidgetErrorCode, PLAYBACK_RATES,
};

use crate::output::{self, OutputFormat};

/// Resolution of the simulated clock
const STEP: Duration = Duration::from_millis(5);

/// Element id the simulated widget replaces
const ELEMENT_ID: &str = "player";

/// One step of a `--script`
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Command(Command),
    Load {
        video_id: String,
        autoplay: bool,
        start: f64,
    },
}

/// Parse `"play; seek 30; volume 40"` into steps
pub fn parse_script(script: &str) -> anyhow::Result<Vec<ScriptStep>> {
    script
        .split(';')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(step: &str) -> anyhow::Result<ScriptStep> {
    let mut words = step.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = words.collect();

    let arg = |index: usize| -> anyhow::Result<&str> {
        args.get(index)
            .copied()
            .with_context(|| format!("'{verb}' is missing an argument"))
    };
    let number = |index: usize| -> anyhow::Result<f64> {
        let raw = arg(index)?;
        raw.parse()
            .with_context(|| format!("'{raw}' is not a number in '{step}'"))
    };

    let command = match verb.as_str() {
        "play" => Command::Play,
        "pause" => Command::Pause,
        "stop" => Command::Stop,
        "seek" => Command::Seek(number(0)?.max(0.0)),
        "volume" => Command::SetVolume(number(0)?.round().clamp(0.0, 100.0) as u8),
        "mute" => Command::Mute,
        "unmute" => Command::UnMute,
        "size" => {
            let raw = arg(0)?;
            let (width, height) = raw
                .split_once('x')
                .with_context(|| format!("size must look like 800x450, got '{raw}'"))?;
            Command::SetSize(Size::new(width.parse()?, height.parse()?))
        }
        "rate" => {
            let rate = number(0)?;
            if !is_supported_rate(rate) {
                bail!("unsupported playback rate {rate}; expected one of {PLAYBACK_RATES:?}");
            }
            Command::SetPlaybackRate(rate)
        }
        "quality" => {
            let quality: PlaybackQuality = arg(0)?.parse().map_err(anyhow::Error::msg)?;
            Command::SetPlaybackQuality(quality)
        }
        "load" | "cue" => {
            return Ok(ScriptStep::Load {
                video_id: arg(0)?.to_string(),
                autoplay: verb == "load",
                start: if args.len() > 1 { number(1)?.max(0.0) } else { 0.0 },
            })
        }
        other => bail!("unknown script command '{other}'"),
    };
    Ok(ScriptStep::Command(command))
}

/// Read player options from a JSON file, or the defaults
pub fn load_options(path: Option<&Path>) -> anyhow::Result<PlayerOptions> {
    let Some(path) = path else {
        return Ok(PlayerOptions::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading options from {}", path.display()))?;
    Ok(PlayerOptions::from_json(&json)?)
}

/// Settings of one simulated session
#[derive(Debug, Clone)]
pub struct Simulation {
    pub video_id: String,
    pub autoplay: bool,
    pub start: f64,
    /// Delay before the player API becomes available
    pub api_after: Duration,
    /// Delay between widget creation and its callbacks reaching the player
    pub ready_after: Duration,
    /// Wall-clock length of the session
    pub duration: Duration,
    /// Length of the simulated video in seconds
    pub video_length: Option<f64>,
    pub options: PlayerOptions,
    pub script: Vec<ScriptStep>,
}

/// Event observed during a simulation, with the session time it was seen at
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub at: Duration,
    pub event: PlayerEvent,
}

/// Run a session against the simulated widget.
///
/// Script steps are issued straight after the initial load, before the API
/// is available, so they go through the pending command queue.
pub async fn run_simulation(
    sim: Simulation,
    mut on_event: impl FnMut(&Observed),
) -> anyhow::Result<Vec<Observed>> {
    let api = match sim.video_length {
        Some(seconds) => SimulatedApi::new().with_video_duration(seconds),
        None => SimulatedApi::new(),
    };
    let ticker = ManualTicker::new();
    let mut player = Player::new(ELEMENT_ID, sim.options, Box::new(ticker.clone()))?;
    let mut rx = player.subscribe();
    let mut observed = Vec::new();

    player.load(sim.video_id.as_str(), sim.autoplay, sim.start)?;
    for step in &sim.script {
        match step {
            ScriptStep::Command(command) => {
                debug!(command = %command, "Issuing scripted command");
                player.dispatch(command.clone());
            }
            ScriptStep::Load {
                video_id,
                autoplay,
                start,
            } => player.load(video_id.as_str(), *autoplay, *start)?,
        }
    }

    let began = Instant::now();
    let mut clock = time::interval(STEP);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut widget_since: Option<Instant> = None;
    let mut last_step = began;
    let mut last_tick = began;

    loop {
        clock.tick().await;
        let now = Instant::now();
        let elapsed = now - began;

        if !player.has_api() && !player.is_destroyed() && elapsed >= sim.api_after {
            info!(elapsed_ms = elapsed.as_millis() as u64, "Player API available");
            player.api_loaded(Box::new(api.clone()))?;
            widget_since = Some(now);
        }

        if widget_since.is_some_and(|since| now - since >= sim.ready_after) {
            if let Some(widget) = api.last_widget() {
                widget.advance(now - last_step);
            }
            while api.has_pending_events() {
                for event in api.take_events() {
                    player.handle_widget_event(event)?;
                }
            }
        }
        last_step = now;

        if ticker.is_running() {
            let period = ticker.period().unwrap_or(STEP);
            if now - last_tick >= period {
                player.tick();
                last_tick = now;
            }
        } else {
            last_tick = now;
        }

        collect(&mut rx, elapsed, &mut observed, &mut on_event);

        if elapsed >= sim.duration || player.is_destroyed() {
            break;
        }
    }

    let elapsed = began.elapsed();
    player.destroy();
    collect(&mut rx, elapsed, &mut observed, &mut on_event);
    Ok(observed)
}

fn collect(
    rx: &mut broadcast::Receiver<PlayerEvent>,
    at: Duration,
    observed: &mut Vec<Observed>,
    on_event: &mut impl FnMut(&Observed),
) {
    while let Ok(event) = rx.try_recv() {
        let entry = Observed { at, event };
        on_event(&entry);
        observed.push(entry);
    }
}

/// `simulate` subcommand
pub async fn simulate(sim: Simulation, format: &str) -> anyhow::Result<()> {
    let format = OutputFormat::from(format);
    if format == OutputFormat::Text {
        output::print_header(&sim.video_id, chrono::Utc::now());
    }

    let observed = run_simulation(sim, |entry| output::print_event(entry, format)).await?;

    if format == OutputFormat::Text {
        output::print_summary(&observed);
    }
    Ok(())
}

/// `embed` subcommand
pub fn embed(
    video_id: &str,
    options_path: Option<&Path>,
    origin: &str,
    format: &str,
) -> anyhow::Result<()> {
    let origin = Url::parse(origin).with_context(|| format!("invalid origin '{origin}'"))?;
    let options = load_options(options_path)?;
    // `Url` always serializes with a trailing slash; the embed origin has none
    let origin = origin.origin().ascii_serialization();
    let config = options.embed_config(video_id, &origin);

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        _ => output::print_embed(&config)?,
    }
    Ok(())
}

/// `states` subcommand
pub fn states(format: &str) -> anyhow::Result<()> {
    output::print_rows(
        PlayerState::ALL.iter().map(|state| output::StateRow {
            code: state.code(),
            name: state.name(),
            event: PlayerEvent::for_state(*state).name(),
            ticker: if *state == PlayerState::Playing {
                "start"
            } else if *state == PlayerState::Cued {
                "-"
            } else {
                "stop"
            },
        }),
        format,
    )
}

/// `errors` subcommand
pub fn errors(format: &str) -> anyhow::Result<()> {
    output::print_rows(
        WidgetErrorCode::ALL.iter().map(|code| output::ErrorRow {
            code: code.code(),
            outcome: if code.is_unplayable() {
                "unplayable"
            } else {
                "ignored"
            },
            description: code.explain(),
        }),
        format,
    )
}
