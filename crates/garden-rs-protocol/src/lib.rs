//! Wire protocol and record model for the memory garden.
//!
//! The backend is a spreadsheet-backed script endpoint, so rows arrive with
//! loosely typed cells. This crate owns the strongly typed [`MemoryRecord`]
//! and the conversion from raw rows and form payloads.

mod event;
mod record;
mod wire;

pub use event::{GardenAction, GardenEvent};
pub use record::{
    BODY_MAX_CHARS, IconId, MemoryRecord, Position, RecordId, TITLE_MAX_CHARS, parse_timestamp,
};
pub use wire::{BackendReply, CreateForm, RecordRow, RowError, WaterForm};
