//! Test helpers shared across garden crates.

pub mod backend;
pub mod records;
pub mod store;

pub use backend::{ENDPOINT_PATH, FakeBackend, Scripted};
pub use records::{context_for, memory, row};
pub use store::InMemoryStore;
