//! Headless workbench core: editor registry, groups and the editor service.

pub mod editor;
pub mod editor_service;
pub mod error;
pub mod services;

pub use editor::{
    Editor, EditorGroup, EditorHandle, EditorRegistry, EditorState, ExtensionEditor, GroupId,
    GroupSnapshot, OpenOptions, Tab, TextEditor,
};
pub use editor_service::EditorService;
pub use error::{OpenError, RegistryError, WorkbenchError};
