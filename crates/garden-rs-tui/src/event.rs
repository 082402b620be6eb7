//! TUI event types for input and garden notifications.

use crossterm::event::KeyEvent;
use garden_rs_protocol::GardenEvent;

/// Application event emitted by input handlers, timers, or the garden.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Left click at a terminal cell.
    Click { column: u16, row: u16 },
    /// Mouse wheel; negative zooms in.
    Scroll(i16),
    /// Periodic tick event.
    Tick,
    /// Event published by the garden service.
    Garden(GardenEvent),
    /// Close the plant form with this token once the save delay elapsed.
    CloseForm(u64),
}
