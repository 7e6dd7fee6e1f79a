//! Disk-backed file layer: open documents live in memory as ropes and are
//! written back on save.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use futures::future::{FutureExt, LocalBoxFuture};
use ropey::Rope;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use crate::kernel::services::adapters::file_watcher::{FileWatcher, WatchEvent};
use crate::kernel::services::ports::file::{FileError, FileEvent, FileLayer, Result};
use crate::models::Resource;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Document {
    path: PathBuf,
    rope: Rope,
    version: u64,
    saved_version: u64,
}

impl Document {
    fn is_dirty(&self) -> bool {
        self.version != self.saved_version
    }

    fn edited(&mut self) {
        self.version += 1;
    }
}

pub struct LocalFileLayer {
    documents: RefCell<FxHashMap<Resource, Document>>,
    watcher: RefCell<Option<FileWatcher>>,
    events: broadcast::Sender<FileEvent>,
}

impl LocalFileLayer {
    pub fn new() -> Self {
        Self {
            documents: RefCell::new(FxHashMap::default()),
            watcher: RefCell::new(None),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    /// Starts reporting external changes below `root` for loaded documents.
    pub fn watch(&self, root: &Path) -> std::result::Result<(), notify::Error> {
        let mut watcher = FileWatcher::new(root)?;
        {
            let documents = self.documents.borrow();
            watcher.sync_open_files(documents.values().map(|d| d.path.as_path()));
        }
        tracing::info!(root = %watcher.root().display(), "watching files");
        *self.watcher.borrow_mut() = Some(watcher);
        Ok(())
    }

    /// Reads the resource from disk unless it is already loaded.
    pub async fn load(&self, resource: &Resource) -> Result<()> {
        if self.documents.borrow().contains_key(resource) {
            return Ok(());
        }
        let path = file_path(resource)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(resource.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(resource = %resource, bytes = text.len(), "document loaded");
        self.documents
            .borrow_mut()
            .entry(resource.clone())
            .or_insert_with(|| Document {
                path,
                rope: Rope::from_str(&text),
                version: 0,
                saved_version: 0,
            });
        self.sync_watcher();
        Ok(())
    }

    pub fn is_loaded(&self, resource: &Resource) -> bool {
        self.documents.borrow().contains_key(resource)
    }

    pub fn text(&self, resource: &Resource) -> Option<String> {
        self.documents
            .borrow()
            .get(resource)
            .map(|d| d.rope.to_string())
    }

    /// Inserts at a char index, clamped to the end of the document.
    pub fn insert(&self, resource: &Resource, char_idx: usize, text: &str) -> Result<()> {
        self.edit(resource, |rope| {
            let at = char_idx.min(rope.len_chars());
            rope.insert(at, text);
        })
    }

    pub fn set_text(&self, resource: &Resource, text: &str) -> Result<()> {
        self.edit(resource, |rope| *rope = Rope::from_str(text))
    }

    /// Forwards pending watcher events to subscribers. Returns how many were sent.
    pub fn pump_watcher(&self) -> usize {
        let drained = match self.watcher.borrow_mut().as_mut() {
            Some(watcher) => watcher.drain_events(),
            None => return 0,
        };

        let mut sent = 0;
        for event in drained {
            let event = match event {
                WatchEvent::Removed(path) => Resource::from_file_path(&path).map(FileEvent::Deleted),
                WatchEvent::Modified(path) => Resource::from_file_path(&path).map(FileEvent::Changed),
            };
            if let Some(event) = event {
                tracing::debug!(?event, "file event");
                let _ = self.events.send(event);
                sent += 1;
            }
        }
        sent
    }

    fn edit<F>(&self, resource: &Resource, f: F) -> Result<()>
    where
        F: FnOnce(&mut Rope),
    {
        let mut documents = self.documents.borrow_mut();
        let doc = documents
            .get_mut(resource)
            .ok_or_else(|| FileError::NotFound(resource.clone()))?;
        f(&mut doc.rope);
        doc.edited();
        Ok(())
    }

    fn sync_watcher(&self) {
        let mut watcher = self.watcher.borrow_mut();
        let Some(watcher) = watcher.as_mut() else {
            return;
        };
        let documents = self.documents.borrow();
        watcher.sync_open_files(documents.values().map(|d| d.path.as_path()));
    }
}

impl Default for LocalFileLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLayer for LocalFileLayer {
    fn is_dirty(&self, resource: &Resource) -> bool {
        self.documents
            .borrow()
            .get(resource)
            .is_some_and(Document::is_dirty)
    }

    fn save<'a>(&'a self, resource: &'a Resource) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            let (path, rope, version) = {
                let documents = self.documents.borrow();
                let doc = documents
                    .get(resource)
                    .ok_or_else(|| FileError::NotFound(resource.clone()))?;
                (doc.path.clone(), doc.rope.clone(), doc.version)
            };

            let target = path.clone();
            tokio::task::spawn_blocking(move || write_rope_to_path(&target, &rope))
                .await
                .map_err(io::Error::other)??;

            // Edits made while the write was in flight keep the document dirty.
            if let Some(doc) = self.documents.borrow_mut().get_mut(resource) {
                doc.saved_version = doc.saved_version.max(version);
            }
            if let Some(watcher) = self.watcher.borrow_mut().as_mut() {
                watcher.acknowledge_write(&path);
            }
            tracing::info!(resource = %resource, "document saved");
            Ok(())
        }
        .boxed_local()
    }

    fn close(&self, resource: &Resource) {
        if self.documents.borrow_mut().remove(resource).is_some() {
            tracing::debug!(resource = %resource, "document released");
            self.sync_watcher();
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<FileEvent> {
        self.events.subscribe()
    }
}

fn file_path(resource: &Resource) -> Result<PathBuf> {
    resource
        .to_file_path()
        .ok_or_else(|| FileError::Unsupported(resource.clone()))
}

fn write_rope_to_path(path: &Path, rope: &Rope) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    for chunk in rope.chunks() {
        writer.write_all(chunk.as_bytes())?;
    }
    writer.flush()
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
