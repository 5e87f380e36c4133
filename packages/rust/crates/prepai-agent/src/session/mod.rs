//! Session namespace: store trait, in-memory and Valkey backends, conditional updates.

mod memory_backend;
mod store;
mod update;
mod valkey_backend;

pub use memory_backend::MemorySessionStore;
pub use store::{CasOutcome, DeleteOutcome, SessionStore};
pub(crate) use update::{UpdateOutcome, load_owned, store_failure, update_session};
pub use valkey_backend::ValkeySessionStore;
