// src/watch/source.rs

//! The change-notification capability the tree watcher registers
//! directories with, plus its `notify`-backed production implementation.

use std::path::Path;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;

/// Raw item delivered by the notification source: an event or a runtime
/// error of the source itself.
pub type RawEvent = notify::Result<Event>;

/// Capacity of the channel between notify's callback thread and the async
/// tree watcher.
pub const RAW_EVENT_BUFFER: usize = 256;

/// Per-directory registration with a change-notification source.
///
/// Directories are registered one by one (non-recursively) so excluded
/// subtrees never produce events at all.
pub trait WatchSource: Send + 'static {
    fn watch(&mut self, path: &Path) -> notify::Result<()>;

    fn unwatch(&mut self, path: &Path) -> notify::Result<()>;

    /// Stop delivering events. Returns `true` only for the call that actually
    /// closed the source.
    fn close(&mut self) -> bool;
}

/// Returns true for the error `unwatch` reports when the path was never
/// registered or the OS already dropped the watch.
pub fn is_watch_not_found(err: &notify::Error) -> bool {
    matches!(err.kind, notify::ErrorKind::WatchNotFound)
}

/// Production source backed by notify's recommended platform watcher.
pub struct NotifySource {
    inner: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl NotifySource {
    /// Create the platform watcher and the channel its events arrive on.
    ///
    /// Failure here is fatal for the session.
    pub fn new() -> Result<(Self, mpsc::Receiver<RawEvent>)> {
        let (event_tx, event_rx) = mpsc::channel::<RawEvent>(RAW_EVENT_BUFFER);

        // Called synchronously on notify's own thread, never on a runtime
        // worker, so blocking_send is allowed here.
        let watcher = RecommendedWatcher::new(
            move |res: RawEvent| {
                if event_tx.blocking_send(res).is_err() {
                    debug!("raw event dropped; tree watcher is gone");
                }
            },
            Config::default(),
        )?;

        Ok((
            Self {
                inner: Some(watcher),
            },
            event_rx,
        ))
    }
}

impl WatchSource for NotifySource {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        match self.inner.as_mut() {
            Some(w) => w.watch(path, RecursiveMode::NonRecursive),
            None => Err(notify::Error::generic("notification source is closed")),
        }
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        match self.inner.as_mut() {
            Some(w) => w.unwatch(path),
            None => Err(notify::Error::generic("notification source is closed")),
        }
    }

    fn close(&mut self) -> bool {
        match self.inner.take() {
            Some(watcher) => {
                drop(watcher);
                info!("file watcher closed");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_not_found_is_recognised() {
        assert!(is_watch_not_found(&notify::Error::watch_not_found()));
        assert!(!is_watch_not_found(&notify::Error::generic("boom")));
    }

    #[tokio::test]
    async fn closing_twice_reports_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut source, _rx) = NotifySource::new().unwrap();
        source.watch(dir.path()).unwrap();

        assert!(source.close());
        assert!(!source.close());
        assert!(source.watch(dir.path()).is_err());
    }
}
