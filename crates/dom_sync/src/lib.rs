//! Asynchronous synchronization primitives over the host document.
//!
//! Everything here runs on a single thread: spawned work goes through
//! `tokio::task::spawn_local`, so callers must be inside a `LocalSet`.

pub mod debounce;
pub mod observer;
pub mod wait;

pub use debounce::{DebounceState, Debouncer};
pub use observer::DomObserverBinding;
pub use wait::{Signal, WaitOptions, await_all_selector, await_selector, race_first};
