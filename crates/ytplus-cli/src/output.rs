//! Output formatting for CLI

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use ytplus_core::{EmbedConfig, PlayerEvent};

use crate::commands::Observed;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

#[derive(Tabled, Serialize)]
pub struct StateRow {
    pub code: i32,
    pub name: &'static str,
    pub event: &'static str,
    pub ticker: &'static str,
}

#[derive(Tabled, Serialize)]
pub struct ErrorRow {
    pub code: i32,
    pub outcome: &'static str,
    pub description: &'static str,
}

#[derive(Tabled)]
struct ParamRow {
    parameter: String,
    value: String,
}

/// One JSON line per observed event
#[derive(Serialize)]
struct EventLine<'a> {
    at_ms: u64,
    #[serde(flatten)]
    event: &'a PlayerEvent,
}

/// Print rows as a table, or as a JSON array
pub fn print_rows<T: Tabled + Serialize>(
    rows: impl IntoIterator<Item = T>,
    format: &str,
) -> anyhow::Result<()> {
    let rows: Vec<T> = rows.into_iter().collect();
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => println!("{}", Table::new(rows).with(Style::rounded())),
    }
    Ok(())
}

pub fn print_header(video_id: &str, started: DateTime<Utc>) {
    println!(
        "{} {} at {}",
        style("Simulating").bold(),
        style(video_id).cyan(),
        started.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

pub fn print_event(entry: &Observed, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let line = EventLine {
                at_ms: entry.at.as_millis() as u64,
                event: &entry.event,
            };
            match serde_json::to_string(&line) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        OutputFormat::Text => {
            let at = format!("[{:>8.3}s]", entry.at.as_secs_f64());
            let event = match &entry.event {
                PlayerEvent::Error { .. } | PlayerEvent::Unplayable(_) => {
                    style(entry.event.to_string()).red()
                }
                PlayerEvent::TimeUpdate(_) => style(entry.event.to_string()).dim(),
                PlayerEvent::Ready | PlayerEvent::Playing => style(entry.event.to_string()).green(),
                _ => style(entry.event.to_string()),
            };
            println!("  {} {}", style(at).dim(), event);
        }
    }
}

pub fn print_summary(observed: &[Observed]) {
    let updates = observed
        .iter()
        .filter(|o| matches!(o.event, PlayerEvent::TimeUpdate(_)))
        .count();
    let last_time = observed.iter().rev().find_map(|o| match o.event {
        PlayerEvent::TimeUpdate(seconds) => Some(seconds),
        _ => None,
    });

    println!();
    println!("  Events: {}", observed.len());
    println!("  Time updates: {updates}");
    if let Some(seconds) = last_time {
        println!("  Last position: {seconds:.3}s");
    }
}

/// Embed config as a parameter table
pub fn print_embed(config: &EmbedConfig) -> anyhow::Result<()> {
    println!(
        "{} {} ({}x{}) from {}",
        style("Embed").bold(),
        style(&config.video_id).cyan(),
        config.width,
        config.height,
        config.host
    );

    let vars = serde_json::to_value(&config.player_vars)?;
    let rows: Vec<ParamRow> = vars
        .as_object()
        .map(|vars| {
            vars.iter()
                .map(|(parameter, value)| ParamRow {
                    parameter: parameter.clone(),
                    value: match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                })
                .collect()
        })
        .unwrap_or_default();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
