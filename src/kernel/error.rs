use std::io;

use crate::kernel::services::ports::FileError;
use crate::models::Resource;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("editor already registered: {0}")]
    DuplicateEditor(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("no registered editor can open {0}")]
    NoEditor(Resource),
    #[error(transparent)]
    File(#[from] FileError),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error("invalid resource: {0}")]
    InvalidResource(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
