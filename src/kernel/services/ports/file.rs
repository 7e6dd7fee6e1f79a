//! File layer contract: dirty tracking, persistence, change notifications.

use std::io;

use futures::future::LocalBoxFuture;
use tokio::sync::broadcast;

use crate::models::Resource;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("not found: {0}")]
    NotFound(Resource),
    #[error("unsupported resource: {0}")]
    Unsupported(Resource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Deleted(Resource),
    Changed(Resource),
}

pub trait FileLayer {
    fn is_dirty(&self, resource: &Resource) -> bool;

    fn save<'a>(&'a self, resource: &'a Resource) -> LocalBoxFuture<'a, Result<()>>;

    /// Releases whatever the layer holds for a resource no editor shows anymore.
    fn close(&self, resource: &Resource);

    fn subscribe(&self) -> broadcast::Receiver<FileEvent>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/file.rs"]
mod tests;
