//! Player commands and the queue that holds them until the widget is ready

use crate::types::{PlaybackQuality, Size};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A state-changing player command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "camelCase")]
pub enum Command {
    Play,
    Pause,
    Stop,
    /// Seek to an absolute position in seconds
    Seek(f64),
    /// Volume in the 0-100 range
    SetVolume(u8),
    Mute,
    UnMute,
    SetSize(Size),
    SetPlaybackRate(f64),
    SetPlaybackQuality(PlaybackQuality),
}

impl Command {
    /// Stable command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Seek(_) => "seek",
            Command::SetVolume(_) => "setVolume",
            Command::Mute => "mute",
            Command::UnMute => "unMute",
            Command::SetSize(_) => "setSize",
            Command::SetPlaybackRate(_) => "setPlaybackRate",
            Command::SetPlaybackQuality(_) => "setPlaybackQuality",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Seek(seconds) => write!(f, "seek({seconds})"),
            Command::SetVolume(volume) => write!(f, "setVolume({volume})"),
            Command::SetSize(size) => write!(f, "setSize({}, {})", size.width, size.height),
            Command::SetPlaybackRate(rate) => write!(f, "setPlaybackRate({rate})"),
            Command::SetPlaybackQuality(quality) => write!(f, "setPlaybackQuality({quality})"),
            other => write!(f, "{}()", other.name()),
        }
    }
}

/// FIFO of commands issued before the widget was ready
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Take every queued command, oldest first, leaving the queue empty
    pub fn drain(&mut self) -> Vec<Command> {
        self.commands.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_is_fifo_and_empties() {
        let mut queue = CommandQueue::new();
        queue.push(Command::SetVolume(40));
        queue.push(Command::Play);
        queue.push(Command::Seek(12.5));

        assert_eq!(queue.len(), 3);
        assert_eq!(
            queue.drain(),
            vec![Command::SetVolume(40), Command::Play, Command::Seek(12.5)]
        );
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::UnMute.name(), "unMute");
        assert_eq!(Command::SetSize(Size::new(1, 2)).to_string(), "setSize(1, 2)");
        assert_eq!(Command::Play.to_string(), "play()");
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(Command::Seek(30.0)).unwrap();
        assert_eq!(json["command"], "seek");
        assert_eq!(json["args"], 30.0);
    }
}
