//! Queued commands example
//!
//! Issues commands before the player API exists and shows them reaching the
//! widget, in order, once it signals ready.
//!
//! Run with: cargo run -p ytplus-core --example queued_commands

use ytplus_core::sim::{ManualTicker, SimulatedApi};
use ytplus_core::{Player, PlayerOptions};

fn main() -> ytplus_core::Result<()> {
    println!("ytplus Core - Queued Commands Example");
    println!("==========================================\n");

    let api = SimulatedApi::new();
    let ticker = Box::new(ManualTicker::new());
    let mut player = Player::new("player", PlayerOptions::default(), ticker)?;
    let mut events = player.subscribe();

    player.load("KGQdWaD6XHM", false, 30.0)?;
    player.set_volume(40.0);
    player.mute();
    player.play();

    println!("Pending before the API loads:");
    for command in player.pending_commands() {
        println!("  {command}");
    }

    player.api_loaded(Box::new(api.clone()))?;
    while api.has_pending_events() {
        for event in api.take_events() {
            player.handle_widget_event(event)?;
        }
    }

    if let Some(widget) = api.last_widget() {
        println!("\nCalls received by the widget:");
        for call in widget.calls() {
            println!("  {call}");
        }
    }

    println!("\nEvents:");
    while let Ok(event) = events.try_recv() {
        println!("  {event}");
    }

    println!("\nState: {} at {:.1}s", player.state(), player.current_time());
    Ok(())
}
