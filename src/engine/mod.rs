//! The embed engine: discovery, per-container state, debounced signals,
//! and the DOM swap, driven by [`Synchronizer`].

pub mod debounce;
pub mod layout;
pub mod scanner;
pub mod swap;
pub mod synchronizer;
pub mod watcher;

pub use layout::{Layout, StaticLayout};
pub use synchronizer::{SyncStats, Synchronizer};
pub use watcher::{ContainerWatcher, ProcessingState};
