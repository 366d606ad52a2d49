//! Shared application state.

pub mod store;

pub use store::{load_classifier, AppState};
