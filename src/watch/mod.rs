// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Deciding which directories and files matter ([`filter`]).
//! - Normalizing raw `notify` event kinds ([`event`]).
//! - Registering directories with a notification source ([`source`]).
//! - Keeping the registry in sync with the tree and emitting triggers
//!   ([`tree`]).
//!
//! It does **not** know about builds or processes; it only turns filesystem
//! changes into triggers.

pub mod event;
pub mod filter;
pub mod source;
pub mod tree;

pub use event::{ChangeKind, classify};
pub use filter::PathFilter;
pub use source::{NotifySource, RAW_EVENT_BUFFER, RawEvent, WatchSource, is_watch_not_found};
pub use tree::TreeWatcher;
