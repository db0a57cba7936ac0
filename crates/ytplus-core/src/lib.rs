//! ytplus Core - typed facade over the embedded YouTube player
//!
//! This crate holds everything that does not depend on a browser:
//! - Player options and the embed parameters derived from them
//! - Commands and the queue that holds them until the widget is ready
//! - Translation of widget state and error codes into named events
//! - Synthesized time updates driven by a host timer
//! - A simulated widget for tests and headless drivers (`sim` feature)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ytplus Core                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   caller ──load / play / seek──▶ ┌──────────────┐               │
//! │                                  │    Player    │──▶ EventBus   │
//! │   host timer ──────tick────────▶ │  (facade)    │               │
//! │                                  └──────┬───────┘               │
//! │        ┌──────────────┐                 │ ▲                     │
//! │        │ CommandQueue │◀── not ready ───┤ │ WidgetEvent         │
//! │        └──────────────┘                 ▼ │                     │
//! │  ┌──────────────┐              ┌────────────────┐               │
//! │  │  PlayerApi   │──creates───▶ │ PlayerBackend  │               │
//! │  └──────────────┘              └────────────────┘               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod player;
#[cfg(feature = "sim")]
pub mod sim;
pub mod types;

pub use backend::{PlayerApi, PlayerBackend, Ticker, WidgetEvent};
pub use command::{Command, CommandQueue};
pub use config::{EmbedConfig, PlayerOptions, PlayerVars};
pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent};
pub use player::Player;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Iframe API script served over https
pub const IFRAME_API_SRC: &str = "https://www.youtube.com/iframe_api";

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "ytplus Core initialized");
}
