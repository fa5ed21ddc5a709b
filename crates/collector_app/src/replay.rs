//! Feeds a recorded transcript through the engine and renders the result.
//!
//! A transcript is JSON Lines: each non-blank line is one logical message,
//! written as a JSON array of the chunks it arrived in.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::DateTime;
use collector_core::{ClassifiedMessage, Package};
use collector_engine::{EngineEvent, EngineHandle, StreamEngine};
use collector_logging::collector_info;

const PREVIEW_CHARS: usize = 60;

pub fn parse_transcript(text: &str) -> Result<Vec<Vec<String>>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Vec<String>>(line)
                .with_context(|| format!("transcript line {} is not an array of chunks", index + 1))
        })
        .collect()
}

/// Commands every host understands.
pub fn register_builtin_commands(engine: &mut StreamEngine) {
    engine.commands_mut().register("info", |invocation| {
        collector_info!(
            "info command: {}",
            invocation.argument.as_deref().unwrap_or("(no argument)")
        );
        Ok(())
    });
}

/// Queues every message, then waits for the engine to drain.
pub fn replay(handle: &EngineHandle, messages: &[Vec<String>]) -> Vec<Package> {
    for chunks in messages {
        for chunk in chunks {
            handle.send_chunk(chunk.as_str());
        }
        handle.end_message(chunks.concat());
    }
    handle.list_packages()
}

pub fn render_summary(packages: &[Package], events: &[EngineEvent]) -> String {
    let completed = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::PackageCompleted(_)))
        .count();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} package(s), {} completed during replay",
        packages.len(),
        completed
    );
    for package in packages {
        let status = if package.complete { "complete" } else { "open" };
        let created = DateTime::from_timestamp_millis(package.created_at)
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| package.created_at.to_string());
        let _ = writeln!(
            out,
            "{} {:?} [{}] created {}, {} item(s)",
            package.id,
            package.name,
            status,
            created,
            package.items.len()
        );
        for item in &package.items {
            let _ = writeln!(out, "  - {}", describe(item));
        }
    }
    out
}

fn describe(item: &ClassifiedMessage) -> String {
    match item {
        ClassifiedMessage::Text(text) => format!("text: {}", preview(text)),
        ClassifiedMessage::CommandCandidate(raw) => format!("command: {raw}"),
        ClassifiedMessage::StructuredPayload(fields) => {
            let mut line = String::from("payload");
            for (key, value) in [
                ("type", &fields.kind),
                ("category", &fields.category),
                ("state", &fields.state),
                ("message", &fields.message),
            ] {
                if let Some(value) = value {
                    let _ = write!(line, " {key}={}", preview(value));
                }
            }
            line
        }
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}
