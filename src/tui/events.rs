//! Terminal event polling.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

/// How long one poll waits before yielding a tick.
pub const TICK_RATE: Duration = Duration::from_millis(100);

/// Events the UI reacts to.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Nothing happened within the tick; redraw for the spinner.
    Tick,
}

/// Blocks up to `timeout` for the next terminal event.
///
/// Key releases (reported on some platforms) are folded into ticks.
pub fn poll(timeout: Duration) -> std::io::Result<Event> {
    if !event::poll(timeout)? {
        return Ok(Event::Tick);
    }

    Ok(match event::read()? {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
        CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
        _ => Event::Tick,
    })
}
