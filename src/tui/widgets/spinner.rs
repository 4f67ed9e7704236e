//! Animated "Thinking" indicator shown while the agent works.

use std::time::Instant;

/// Braille frames, advanced every `FRAME_MS`.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const FRAME_MS: u128 = 100;

#[derive(Debug, Clone)]
pub struct Spinner {
    started: Instant,
    label: &'static str,
}

impl Spinner {
    pub fn thinking() -> Self {
        Self {
            started: Instant::now(),
            label: "Thinking",
        }
    }

    pub fn frame(&self) -> &'static str {
        let index = (self.started.elapsed().as_millis() / FRAME_MS) as usize;
        FRAMES[index % FRAMES.len()]
    }

    /// Frame, label and elapsed whole seconds, e.g. `⠙ Thinking (3s)`.
    pub fn display(&self) -> String {
        format!(
            "{} {} ({}s)",
            self.frame(),
            self.label,
            self.started.elapsed().as_secs()
        )
    }

    pub fn label(&self) -> &str {
        self.label
    }
}
