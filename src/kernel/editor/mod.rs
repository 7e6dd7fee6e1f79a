//! Editor domain: editor kinds, groups of tabs, published selection state.

mod builtin;
mod group;
mod registry;
mod state;

pub use builtin::{ExtensionEditor, TextEditor};
pub use group::{EditorGroup, GroupHost};
pub use registry::{Editor, EditorRegistry};
pub use state::{
    EditorHandle, EditorState, GroupId, GroupSnapshot, OpenOptions, Tab, TabSpec,
};
