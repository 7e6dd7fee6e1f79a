use std::fmt;
use std::rc::Rc;

use crate::models::Resource;

use super::registry::Editor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// An editor instance as owned by one group.
#[derive(Clone)]
pub struct EditorHandle {
    group: GroupId,
    instance: Rc<dyn Editor>,
}

impl EditorHandle {
    pub fn new(group: GroupId, instance: Rc<dyn Editor>) -> Self {
        Self { group, instance }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn instance(&self) -> &Rc<dyn Editor> {
        &self.instance
    }
}

// Instance names are unique within a group, so (group, name) identifies the instance.
impl PartialEq for EditorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.name() == other.name()
    }
}

impl Eq for EditorHandle {}

impl fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorHandle")
            .field("group", &self.group)
            .field("name", &self.name())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    pub resource: Resource,
    pub editor: EditorHandle,
    pub title: String,
    pub icon: Option<String>,
    pub tooltip: String,
    pub preview: bool,
}

impl Tab {
    pub(super) fn new(resource: Resource, editor: EditorHandle, spec: TabSpec) -> Self {
        Self {
            resource,
            editor,
            title: spec.title,
            icon: spec.icon,
            tooltip: spec.tooltip,
            preview: spec.preview,
        }
    }

    pub(super) fn apply(&mut self, editor: EditorHandle, spec: TabSpec) {
        self.editor = editor;
        self.title = spec.title;
        self.icon = spec.icon;
        self.tooltip = spec.tooltip;
        self.preview = spec.preview;
    }
}

/// Presentation of a tab as computed by the service before delegating to a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabSpec {
    pub title: String,
    pub icon: Option<String>,
    pub tooltip: String,
    pub preview: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub preview: bool,
    pub open_to_side: bool,
    pub group: Option<GroupId>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl OpenOptions {
    pub fn preview() -> Self {
        Self {
            preview: true,
            ..Self::default()
        }
    }

    pub fn to_side() -> Self {
        Self {
            open_to_side: true,
            ..Self::default()
        }
    }

    pub fn in_group(group: GroupId) -> Self {
        Self {
            group: Some(group),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Global selection, published as an immutable snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorState {
    pub active_group: Option<GroupId>,
    pub active_editor: Option<EditorHandle>,
    pub active_resource: Option<Resource>,
    pub visible_editors: Vec<EditorHandle>,
}

impl EditorState {
    pub fn is_cleared(&self) -> bool {
        self.active_group.is_none()
            && self.active_editor.is_none()
            && self.active_resource.is_none()
            && self.visible_editors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub tabs: Vec<Tab>,
    pub active: Option<usize>,
}

impl GroupSnapshot {
    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|i| self.tabs.get(i))
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.tabs.iter().any(|t| &t.resource == resource)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/state.rs"]
mod tests;
