//! Core of the memory garden.
//!
//! This crate owns the freshness decay model, marker presentation, the
//! record store client, and the [`Garden`] service that ties them together
//! through an explicit [`GardenContext`].

pub mod clock;
pub mod context;
pub mod decay;
pub mod draft;
pub mod error;
pub mod event_bus;
pub mod garden;
pub mod presentation;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::GardenContext;
pub use decay::{DecayModel, is_visible, opacity, render_opacity};
pub use draft::{NewRecord, RecordDraft};
pub use error::{ErrorKind, StoreError, ValidationError};
pub use event_bus::{DEFAULT_EVENT_BUFFER, EventBus, Subscription};
pub use garden::Garden;
pub use presentation::{IconSize, MarkerView, Popup, Presenter, icon_asset};
pub use store::{Created, HttpRecordStore, Listing, RecordStore, parse_listing, parse_reply};
