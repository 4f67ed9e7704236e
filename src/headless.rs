//! Headless mode for scripting and automation.
//!
//! Feeds input lines through the same orchestrator the TUI uses and prints
//! the transcript as text or JSON.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::app::{redact_input, InputResult, Orchestrator};
use crate::error::{ChatError, Result};
use crate::session::{ChatMessage, Session};

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub input: String,
    pub outcome: &'static str,
    pub text: String,
}

impl TranscriptEntry {
    fn new(input: &str, result: &InputResult) -> Self {
        let (outcome, text) = match result {
            InputResult::None => ("none", ""),
            InputResult::Replied(text) => ("reply", text.as_str()),
            InputResult::ConfirmationRequired(text) => ("confirmation", text.as_str()),
            InputResult::Notice(text) => ("notice", text.as_str()),
            InputResult::Failed(text) => ("failed", text.as_str()),
            InputResult::Halted(text) => ("halted", text.as_str()),
            InputResult::Exit => ("exit", ""),
        };
        Self {
            input: redact_input(input),
            outcome,
            text: text.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, "failed" | "halted")
    }
}

/// Result of a headless run.
#[derive(Debug, Serialize)]
pub struct HeadlessReport {
    pub transcript: Vec<TranscriptEntry>,
    /// Final session log.
    pub messages: Vec<ChatMessage>,
    pub failures: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl HeadlessReport {
    pub fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.format_text()),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .map(|json| format!("{json}\n"))
                .map_err(|e| ChatError::internal(format!("Failed to serialize report: {e}"))),
        }
    }

    fn format_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.transcript {
            out.push_str(&format!("> {}\n", entry.input));
            match entry.outcome {
                "failed" | "halted" => out.push_str(&format!("[{}] {}\n", entry.outcome, entry.text)),
                _ if entry.text.is_empty() => {}
                _ => out.push_str(&format!("{}\n", entry.text)),
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "Inputs: {} processed, {} failed in {}ms\n",
            self.transcript.len(),
            self.failures,
            self.duration.as_millis()
        ));
        out
    }
}

/// Runs input lines through an orchestrator with a fresh session.
pub struct HeadlessRunner {
    orchestrator: Orchestrator,
    session: Session,
}

impl HeadlessRunner {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            session: Session::new(),
        }
    }

    /// Processes every line in order, stopping early at `/quit`.
    ///
    /// Internal errors abort the run; agent and connection failures are
    /// recorded in the transcript and counted.
    pub async fn run<I>(mut self, inputs: I) -> Result<HeadlessReport>
    where
        I: IntoIterator<Item = String>,
    {
        let start = Instant::now();
        let mut transcript = Vec::new();

        for input in inputs {
            debug!("Headless input: {}", redact_input(&input));
            let result = self.orchestrator.handle_input(&mut self.session, &input).await?;
            let entry = TranscriptEntry::new(&input, &result);
            transcript.push(entry);

            if result == InputResult::Exit {
                break;
            }
        }

        self.orchestrator.close().await?;

        let failures = transcript.iter().filter(|e| e.is_failure()).count();
        info!("Headless run finished: {} inputs, {} failed", transcript.len(), failures);

        Ok(HeadlessReport {
            transcript,
            messages: self.session.render().cloned().collect(),
            failures,
            duration: start.elapsed(),
        })
    }
}

/// Splits a script into input lines, dropping blank lines and `#` comments.
pub fn parse_script(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads a script from a file, or from stdin when `source` is `-`.
pub fn read_script(source: &str) -> Result<Vec<String>> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ChatError::config(format!("Failed to read script from stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| ChatError::config(format!("Failed to read script {source}: {e}")))?
    };
    Ok(parse_script(&content))
}

/// Writes the formatted report to a file, or stdout when no path is given.
pub fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            ChatError::internal(format!("Failed to write output to {}: {e}", path.display()))
        }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Settings for a headless run.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}
