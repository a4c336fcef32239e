//! File change events.
//!
//! [`NotifyFileSource`] forwards OS file notifications for one file.
//! [`ChannelFileSource`] lets a caller push events by hand.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::MeterError;

/// Events buffered per watch. Overflow is dropped; one pending event is
/// enough to trigger a comparison.
const EVENT_BUFFER: usize = 16;

/// A change to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    /// Created or modified.
    Changed,
    /// Removed.
    Removed,
}

/// Produces change events for one path.
pub trait FileEventSource: Send + Sync {
    /// Starts watching `path`.
    ///
    /// Watching stops once the returned receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be set up.
    fn watch(&self, path: &Path) -> Result<mpsc::Receiver<FileEvent>, MeterError>;
}

// ============================================================================
// Notify
// ============================================================================

/// Watches the file's parent directory with the platform's recommended
/// watcher, so editors that save by renaming a temp file are still seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyFileSource;

impl NotifyFileSource {
    /// Creates the source.
    pub fn new() -> Self {
        Self
    }
}

/// Maps a notify event kind to a [`FileEvent`]. Access events are ignored.
fn classify(kind: &EventKind) -> Option<FileEvent> {
    match kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(FileEvent::Removed)
        }
        EventKind::Create(_) | EventKind::Modify(_) => Some(FileEvent::Changed),
        _ => None,
    }
}

fn targets(event: &Event, file_name: Option<&OsString>) -> bool {
    event
        .paths
        .iter()
        .any(|p| p.file_name() == file_name.map(OsString::as_os_str))
}

impl FileEventSource for NotifyFileSource {
    fn watch(&self, path: &Path) -> Result<mpsc::Receiver<FileEvent>, MeterError> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let file_name = path.file_name().map(ToOwned::to_owned);
        let dir: PathBuf = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let sender = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !targets(&event, file_name.as_ref()) {
                    return;
                }
                if let Some(file_event) = classify(&event.kind) {
                    trace!(kind = ?event.kind, ?file_event, "File event");
                    let _ = sender.try_send(file_event);
                }
            }
            Err(e) => warn!(error = %e, "File watch error"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(path = %path.display(), "Watching file");

        // The watcher lives until the receiver is dropped.
        let path = path.to_path_buf();
        tokio::spawn(async move {
            tx.closed().await;
            drop(watcher);
            debug!(path = %path.display(), "Stopped watching file");
        });

        Ok(rx)
    }
}

// ============================================================================
// Manual
// ============================================================================

/// Source fed through a sender, for hosts with their own notifications.
pub struct ChannelFileSource {
    rx: Mutex<Option<mpsc::Receiver<FileEvent>>>,
}

impl ChannelFileSource {
    /// Creates the source and its feeding sender.
    pub fn new() -> (Self, mpsc::Sender<FileEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl FileEventSource for ChannelFileSource {
    /// Hands out the receiver once; later calls get a closed channel.
    fn watch(&self, _path: &Path) -> Result<mpsc::Receiver<FileEvent>, MeterError> {
        let taken = self.rx.lock().ok().and_then(|mut rx| rx.take());
        Ok(taken.unwrap_or_else(|| mpsc::channel(1).1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::time::Duration;

    /// Waits for `wanted`, skipping other events.
    async fn next_matching(rx: &mut mpsc::Receiver<FileEvent>, wanted: FileEvent) -> bool {
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = rx.recv().await {
                if event == wanted {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&EventKind::Create(CreateKind::File)), Some(FileEvent::Changed));
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileEvent::Changed)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(FileEvent::Changed)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(FileEvent::Removed)
        );
        assert_eq!(classify(&EventKind::Remove(RemoveKind::File)), Some(FileEvent::Removed));
        assert_eq!(classify(&EventKind::Any), None);
    }

    #[test]
    fn test_only_the_watched_file_counts() {
        let name = Some(OsString::from("settings.json"));
        let event = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/x/settings.json"));
        let other = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/x/other.json"));

        assert!(targets(&event, name.as_ref()));
        assert!(!targets(&other, name.as_ref()));
    }

    #[tokio::test]
    async fn test_same_length_rewrite_and_removal_are_seen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, r#"{"env": {"A": "1"}}"#).await.unwrap();

        let mut rx = NotifyFileSource::new().watch(&path).unwrap();

        tokio::fs::write(&path, r#"{"env": {"A": "2"}}"#).await.unwrap();
        assert!(next_matching(&mut rx, FileEvent::Changed).await);

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(next_matching(&mut rx, FileEvent::Removed).await);
    }

    #[tokio::test]
    async fn test_channel_source_hands_out_once() {
        let (source, tx) = ChannelFileSource::new();
        let mut first = source.watch(Path::new("a")).unwrap();
        let mut second = source.watch(Path::new("a")).unwrap();

        tx.send(FileEvent::Changed).await.unwrap();
        assert_eq!(first.recv().await, Some(FileEvent::Changed));
        assert_eq!(second.recv().await, None);
    }
}
