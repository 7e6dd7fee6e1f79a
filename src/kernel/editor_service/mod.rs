//! Top-level orchestration of editor groups: target resolution, close guards,
//! persistence, and the published group/selection snapshots.

mod close;
mod handlers;
mod open;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::{broadcast, watch};

use crate::kernel::editor::{
    Editor, EditorGroup, EditorRegistry, EditorState, GroupId, GroupSnapshot,
};
use crate::kernel::error::RegistryError;
use crate::kernel::services::ports::{DialogService, FileEvent, FileLayer, WorkbenchConfig};
use crate::models::Resource;

use handlers::ServiceHandle;

struct ServiceInner {
    config: WorkbenchConfig,
    registry: RefCell<EditorRegistry>,
    groups: RefCell<Vec<Rc<EditorGroup>>>,
    next_group_id: Cell<u64>,
    files: Rc<dyn FileLayer>,
    dialogs: Rc<dyn DialogService>,
    state_tx: watch::Sender<EditorState>,
    groups_tx: watch::Sender<Vec<GroupSnapshot>>,
    will_open_tx: watch::Sender<Option<Resource>>,
    did_open_tx: watch::Sender<Option<Resource>>,
}

/// Cheap to clone; all clones share the same workbench. Not `Send`: the service
/// lives on one thread and its futures are driven there.
#[derive(Clone)]
pub struct EditorService {
    inner: Rc<ServiceInner>,
}

impl EditorService {
    pub fn new(
        files: Rc<dyn FileLayer>,
        dialogs: Rc<dyn DialogService>,
        config: WorkbenchConfig,
    ) -> Self {
        let inner = ServiceInner {
            config,
            registry: RefCell::new(EditorRegistry::new()),
            groups: RefCell::new(Vec::new()),
            next_group_id: Cell::new(1),
            files,
            dialogs,
            state_tx: watch::channel(EditorState::default()).0,
            groups_tx: watch::channel(Vec::new()).0,
            will_open_tx: watch::channel(None).0,
            did_open_tx: watch::channel(None).0,
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.inner.config
    }

    pub fn register_editors<I>(&self, editors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Box<dyn Editor>>,
    {
        self.inner.registry.borrow_mut().register(editors)
    }

    pub fn registered_editors(&self) -> Vec<String> {
        self.inner
            .registry
            .borrow()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn is_opened(&self, resource: &Resource) -> bool {
        self.inner.is_opened(resource)
    }

    pub fn is_active_group(&self, group: GroupId) -> bool {
        self.inner.state_tx.borrow().active_group == Some(group)
    }

    /// Returns `false` if no live group has this id.
    pub fn set_active_group(&self, group: GroupId) -> bool {
        match self.find_group_by_id(group) {
            Some(group) => {
                self.inner.activate(&group);
                true
            }
            None => false,
        }
    }

    /// Selects a tab inside a group and makes that group active.
    pub fn activate_tab(&self, group: GroupId, index: usize) -> bool {
        let Some(group) = self.find_group_by_id(group) else {
            return false;
        };
        group.set_active_tab(index);
        self.inner.publish_groups();
        self.inner.activate(&group);
        true
    }

    pub fn find_group<P>(&self, predicate: P) -> Option<Rc<EditorGroup>>
    where
        P: Fn(&EditorGroup) -> bool,
    {
        self.inner
            .groups
            .borrow()
            .iter()
            .find(|g| predicate(g))
            .cloned()
    }

    pub fn find_groups<P>(&self, predicate: P) -> Vec<Rc<EditorGroup>>
    where
        P: Fn(&EditorGroup) -> bool,
    {
        self.inner
            .groups
            .borrow()
            .iter()
            .filter(|g| predicate(g))
            .cloned()
            .collect()
    }

    pub fn find_group_by_id(&self, id: GroupId) -> Option<Rc<EditorGroup>> {
        self.find_group(|g| g.id() == id)
    }

    pub fn group_count(&self) -> usize {
        self.inner.groups.borrow().len()
    }

    pub fn state(&self) -> EditorState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn groups(&self) -> Vec<GroupSnapshot> {
        self.inner.groups_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<EditorState> {
        self.inner.state_tx.subscribe()
    }

    pub fn subscribe_groups(&self) -> watch::Receiver<Vec<GroupSnapshot>> {
        self.inner.groups_tx.subscribe()
    }

    pub fn subscribe_will_open(&self) -> watch::Receiver<Option<Resource>> {
        self.inner.will_open_tx.subscribe()
    }

    pub fn subscribe_did_open(&self) -> watch::Receiver<Option<Resource>> {
        self.inner.did_open_tx.subscribe()
    }

    /// Applies one file layer notification. Deleted resources are closed
    /// everywhere without confirmation.
    pub async fn handle_file_event(&self, event: FileEvent) {
        match event {
            FileEvent::Deleted(resource) => {
                tracing::info!(resource = %resource, "resource deleted, closing editors");
                if let Err(err) = self.close(&resource, true).await {
                    tracing::warn!(resource = %resource, error = %err, "closing deleted resource failed");
                }
            }
            FileEvent::Changed(resource) => {
                tracing::debug!(resource = %resource, "resource changed");
            }
        }
    }

    /// Drives the file layer's event stream until it closes.
    pub async fn run_file_events(&self) {
        let mut rx = self.inner.files.subscribe();
        loop {
            match rx.recv().await {
                Ok(event) => self.handle_file_event(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "file events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

impl ServiceInner {
    fn handle(self: &Rc<Self>) -> Rc<ServiceHandle> {
        Rc::new(ServiceHandle::new(Rc::downgrade(self)))
    }

    fn is_opened(&self, resource: &Resource) -> bool {
        self.groups.borrow().iter().any(|g| g.contains(resource))
    }

    fn create_group(self: &Rc<Self>) -> Rc<EditorGroup> {
        let id = GroupId::new(self.next_group_id.get());
        self.next_group_id.set(id.raw() + 1);
        let editors = self.registry.borrow().instantiate_all();
        tracing::debug!(group = %id, editors = editors.len(), "group created");
        Rc::new(EditorGroup::new(id, editors, self.handle()))
    }

    fn insert_group(&self, group: &Rc<EditorGroup>) {
        let mut groups = self.groups.borrow_mut();
        if !groups.iter().any(|g| g.id() == group.id()) {
            groups.push(Rc::clone(group));
        }
    }

    fn remove_group(&self, id: GroupId) -> bool {
        let mut groups = self.groups.borrow_mut();
        let before = groups.len();
        groups.retain(|g| g.id() != id);
        let removed = groups.len() != before;
        if removed {
            tracing::debug!(group = %id, "group removed");
        }
        removed
    }

    fn visible_editors(&self) -> Vec<crate::kernel::editor::EditorHandle> {
        self.groups
            .borrow()
            .iter()
            .filter_map(|g| g.active_editor())
            .collect()
    }

    fn publish_groups(&self) {
        let snapshot: Vec<GroupSnapshot> =
            self.groups.borrow().iter().map(|g| g.snapshot()).collect();
        self.groups_tx.send_replace(snapshot);
    }

    fn publish_state(&self, state: EditorState) {
        self.state_tx.send_replace(state);
    }

    fn activate(&self, group: &EditorGroup) {
        self.publish_state(EditorState {
            active_group: Some(group.id()),
            active_editor: group.active_editor(),
            active_resource: group.active_resource(),
            visible_editors: self.visible_editors(),
        });
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor_service.rs"]
mod tests;
