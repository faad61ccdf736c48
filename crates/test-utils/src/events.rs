//! Shorthands for raw notification events.

use std::path::Path;

use escort::watch::RawEvent;
use notify::event::{CreateKind, DataChange, EventKind, ModifyKind, RemoveKind, RenameMode};
use notify::Event;

fn event(kind: EventKind, path: &Path) -> RawEvent {
    Ok(Event::new(kind).add_path(path.to_path_buf()))
}

pub fn created(path: &Path) -> RawEvent {
    event(EventKind::Create(CreateKind::Any), path)
}

pub fn written(path: &Path) -> RawEvent {
    event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), path)
}

pub fn removed(path: &Path) -> RawEvent {
    event(EventKind::Remove(RemoveKind::Any), path)
}

pub fn renamed(from: &Path, to: &Path) -> RawEvent {
    Ok(Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(from.to_path_buf())
        .add_path(to.to_path_buf()))
}

pub fn source_error(msg: &str) -> RawEvent {
    Err(notify::Error::generic(msg))
}
