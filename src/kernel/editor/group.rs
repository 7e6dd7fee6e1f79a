use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::kernel::error::OpenError;
use crate::kernel::services::ports::FileResult;
use crate::models::Resource;

use super::registry::Editor;
use super::state::{EditorHandle, GroupId, GroupSnapshot, Tab, TabSpec};

/// Callbacks from a group into whatever owns it.
pub trait GroupHost {
    fn group_opened(&self, group: Rc<EditorGroup>, editor: EditorHandle, resource: &Resource);

    fn group_closed(&self, group: Rc<EditorGroup>, resource: &Resource, was_preview: bool);

    /// Resolves to `Ok(false)` to veto a non-forced close. Errors (a failed
    /// save before closing) reach the caller of [`EditorGroup::close`].
    fn confirm_close(
        &self,
        group: GroupId,
        resource: Resource,
    ) -> LocalBoxFuture<'static, FileResult<bool>>;
}

#[derive(Debug, Default)]
struct GroupTabs {
    tabs: Vec<Tab>,
    active: usize,
}

impl GroupTabs {
    fn position(&self, resource: &Resource) -> Option<usize> {
        self.tabs.iter().position(|t| &t.resource == resource)
    }

    fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    fn push(&mut self, tab: Tab) {
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
    }

    fn open(&mut self, resource: Resource, editor: EditorHandle, spec: TabSpec) {
        let existing = self.position(&resource);

        if spec.preview {
            if let Some(index) = existing {
                // A permanent tab is never demoted back to preview.
                if self.tabs[index].preview {
                    self.tabs[index].apply(editor, spec);
                }
                self.active = index;
                return;
            }
            if let Some(index) = self.tabs.iter().position(|t| t.preview) {
                self.tabs[index] = Tab::new(resource, editor, spec);
                self.active = index;
                return;
            }
            self.push(Tab::new(resource, editor, spec));
            return;
        }

        match existing {
            Some(index) => {
                self.tabs[index].apply(editor, spec);
                self.active = index;
            }
            None => self.push(Tab::new(resource, editor, spec)),
        }
    }

    fn remove(&mut self, resource: &Resource) -> Option<Tab> {
        let index = self.position(resource)?;
        let tab = self.tabs.remove(index);
        if self.tabs.is_empty() {
            self.active = 0;
        } else if self.active >= self.tabs.len() {
            self.active = self.tabs.len() - 1;
        } else if self.active > index {
            self.active -= 1;
        }
        Some(tab)
    }
}

/// One pane of tabs. Owns its editor instances; talks back to its owner only
/// through the [`GroupHost`] handle.
pub struct EditorGroup {
    id: GroupId,
    editors: Vec<Rc<dyn Editor>>,
    host: Rc<dyn GroupHost>,
    tabs: RefCell<GroupTabs>,
}

impl std::fmt::Debug for EditorGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tabs = self.tabs.borrow();
        f.debug_struct("EditorGroup")
            .field("id", &self.id)
            .field("tabs", &tabs.tabs.len())
            .field("active", &tabs.active)
            .finish()
    }
}

impl EditorGroup {
    pub fn new(id: GroupId, editors: Vec<Rc<dyn Editor>>, host: Rc<dyn GroupHost>) -> Self {
        Self {
            id,
            editors,
            host,
            tabs: RefCell::new(GroupTabs::default()),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.tabs.borrow().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.borrow().tabs.is_empty()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.tabs.borrow().tabs.clone()
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.tabs
            .borrow()
            .tabs
            .iter()
            .map(|t| t.resource.clone())
            .collect()
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        let tabs = self.tabs.borrow();
        GroupSnapshot {
            id: self.id,
            tabs: tabs.tabs.clone(),
            active: (!tabs.tabs.is_empty()).then_some(tabs.active),
        }
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.tabs.borrow().active_tab().cloned()
    }

    pub fn active_editor(&self) -> Option<EditorHandle> {
        self.tabs.borrow().active_tab().map(|t| t.editor.clone())
    }

    pub fn active_resource(&self) -> Option<Resource> {
        self.tabs.borrow().active_tab().map(|t| t.resource.clone())
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.tabs.borrow().position(resource).is_some()
    }

    pub fn contains_preview(&self, resource: &Resource) -> bool {
        self.tabs
            .borrow()
            .tabs
            .iter()
            .any(|t| t.preview && &t.resource == resource)
    }

    pub fn preview_resource(&self) -> Option<Resource> {
        self.tabs
            .borrow()
            .tabs
            .iter()
            .find(|t| t.preview)
            .map(|t| t.resource.clone())
    }

    pub fn set_active_tab(&self, index: usize) -> bool {
        let mut tabs = self.tabs.borrow_mut();
        if tabs.tabs.is_empty() {
            return false;
        }
        let index = index.min(tabs.tabs.len() - 1);
        if index == tabs.active {
            return false;
        }
        tabs.active = index;
        true
    }

    pub fn next_tab(&self) -> bool {
        let mut tabs = self.tabs.borrow_mut();
        let len = tabs.tabs.len();
        if len <= 1 {
            return false;
        }
        tabs.active = (tabs.active + 1) % len;
        true
    }

    pub fn prev_tab(&self) -> bool {
        let mut tabs = self.tabs.borrow_mut();
        let len = tabs.tabs.len();
        if len <= 1 {
            return false;
        }
        tabs.active = if tabs.active == 0 {
            len - 1
        } else {
            tabs.active - 1
        };
        true
    }

    fn resolve_editor(&self, resource: &Resource) -> Option<Rc<dyn Editor>> {
        let tabs = self.tabs.borrow();
        if let Some(index) = tabs.position(resource) {
            return Some(Rc::clone(tabs.tabs[index].editor.instance()));
        }
        self.editors
            .iter()
            .find(|e| e.can_handle(resource))
            .map(Rc::clone)
    }

    pub async fn open(
        self: &Rc<Self>,
        resource: Resource,
        spec: TabSpec,
    ) -> Result<EditorHandle, OpenError> {
        let instance = self
            .resolve_editor(&resource)
            .ok_or_else(|| OpenError::NoEditor(resource.clone()))?;
        instance.open(&resource).await?;

        let editor = EditorHandle::new(self.id, instance);
        self.tabs
            .borrow_mut()
            .open(resource.clone(), editor.clone(), spec);

        tracing::debug!(
            group = %self.id,
            resource = %resource,
            editor = editor.name(),
            "tab opened"
        );
        self.host
            .group_opened(Rc::clone(self), editor.clone(), &resource);
        Ok(editor)
    }

    /// Returns whether the tab was removed. A vetoed or failed close leaves
    /// the group untouched.
    pub async fn close(self: &Rc<Self>, resource: &Resource, force: bool) -> FileResult<bool> {
        if !self.contains(resource) {
            return Ok(false);
        }

        if !force && !self.host.confirm_close(self.id, resource.clone()).await? {
            tracing::debug!(group = %self.id, resource = %resource, "close vetoed");
            return Ok(false);
        }

        // The tab may have gone away while the guard was pending.
        let Some(tab) = self.tabs.borrow_mut().remove(resource) else {
            return Ok(false);
        };

        tracing::debug!(
            group = %self.id,
            resource = %resource,
            preview = tab.preview,
            "tab closed"
        );
        self.host
            .group_closed(Rc::clone(self), resource, tab.preview);
        Ok(true)
    }

    /// Closes tabs in order and stops at the first vetoed or failed close.
    pub async fn close_all(self: &Rc<Self>, force: bool) -> FileResult<bool> {
        for resource in self.resources() {
            if !self.close(&resource, force).await? && self.contains(&resource) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/group.rs"]
mod tests;
