//! File watcher for the issues file.
//!
//! Watches the beads directory with `notify` and reports when the issues file
//! changed, so the viewer can reload and follow mode can pick up new issues.

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

pub struct IssueWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    file_name: Option<OsString>,
}

impl IssueWatcher {
    pub fn new(issues_path: &Path, poll_interval: Duration) -> Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(poll_interval),
        )?;

        // Watch the parent directory: exporters usually replace the file
        let dir = issues_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name: issues_path.file_name().map(OsString::from),
        })
    }

    /// Drain pending events; true if any touched the issues file.
    pub fn poll(&self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => changed |= self.is_relevant(&event),
                Ok(Err(e)) => tracing::debug!("Watcher error: {}", e),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    fn is_relevant(&self, event: &Event) -> bool {
        match &self.file_name {
            Some(name) => event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(name.as_os_str())),
            None => true,
        }
    }
}
