//! File layer without any storage behind it: dirty flags, a save log, and a
//! deletion trigger. Used headless and in tests.

use std::cell::RefCell;
use std::io;

use futures::future::{FutureExt, LocalBoxFuture};
use rustc_hash::FxHashSet;
use tokio::sync::broadcast;

use crate::kernel::services::ports::file::{FileError, FileEvent, FileLayer, Result};
use crate::models::Resource;

const EVENT_CAPACITY: usize = 64;

pub struct MemoryFileLayer {
    dirty: RefCell<FxHashSet<Resource>>,
    failing: RefCell<FxHashSet<Resource>>,
    saved: RefCell<Vec<Resource>>,
    closed: RefCell<Vec<Resource>>,
    events: broadcast::Sender<FileEvent>,
}

impl MemoryFileLayer {
    pub fn new() -> Self {
        Self {
            dirty: RefCell::new(FxHashSet::default()),
            failing: RefCell::new(FxHashSet::default()),
            saved: RefCell::new(Vec::new()),
            closed: RefCell::new(Vec::new()),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    pub fn mark_dirty(&self, resource: &Resource) {
        self.dirty.borrow_mut().insert(resource.clone());
    }

    pub fn mark_clean(&self, resource: &Resource) {
        self.dirty.borrow_mut().remove(resource);
    }

    /// Makes every later save of `resource` fail.
    pub fn fail_saves_for(&self, resource: &Resource) {
        self.failing.borrow_mut().insert(resource.clone());
    }

    pub fn saved(&self) -> Vec<Resource> {
        self.saved.borrow().clone()
    }

    pub fn closed(&self) -> Vec<Resource> {
        self.closed.borrow().clone()
    }

    /// Drops the dirty flag and announces the deletion to subscribers.
    pub fn delete(&self, resource: &Resource) {
        self.dirty.borrow_mut().remove(resource);
        let _ = self.events.send(FileEvent::Deleted(resource.clone()));
    }

    pub fn emit(&self, event: FileEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for MemoryFileLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLayer for MemoryFileLayer {
    fn is_dirty(&self, resource: &Resource) -> bool {
        self.dirty.borrow().contains(resource)
    }

    fn save<'a>(&'a self, resource: &'a Resource) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            tokio::task::yield_now().await;
            if self.failing.borrow().contains(resource) {
                return Err(FileError::Io(io::Error::other(format!(
                    "save rejected: {resource}"
                ))));
            }
            self.dirty.borrow_mut().remove(resource);
            self.saved.borrow_mut().push(resource.clone());
            Ok(())
        }
        .boxed_local()
    }

    fn close(&self, resource: &Resource) {
        self.closed.borrow_mut().push(resource.clone());
    }

    fn subscribe(&self) -> broadcast::Receiver<FileEvent> {
        self.events.subscribe()
    }
}
