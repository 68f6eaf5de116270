#![forbid(unsafe_code)]

pub mod state;
pub mod store;

pub use state::State;
pub use store::{DEFAULT_SCOPE, InMemoryStore, JsonFileStore, StateStore, StoreError};
