// src/watch/event.rs

//! Normalising raw `notify` events into the handful of cases the tree
//! watcher cares about.

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// How a raw filesystem event is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Permission/ownership/timestamp-only changes and plain accesses.
    Ignored,
    /// The path is gone (deleted or renamed away).
    Removed,
    /// The path appeared (created or renamed into place).
    Created,
    /// A rename whose direction the platform did not report; resolved by
    /// checking whether the path still exists.
    Renamed,
    /// Content or anything else that might matter.
    Changed,
}

/// Classify the event kind for a single path.
///
/// For `RenameMode::Both` events notify reports `[from, to]`; pass the index
/// of the path within the event so the two halves are told apart.
pub fn classify(kind: &EventKind, path_index: usize) -> ChangeKind {
    match kind {
        EventKind::Access(_) => ChangeKind::Ignored,
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Ignored,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if path_index == 0 {
                ChangeKind::Removed
            } else {
                ChangeKind::Created
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        _ => ChangeKind::Changed,
    }
}
