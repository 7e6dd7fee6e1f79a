use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::kernel::editor::{EditorGroup, EditorHandle, EditorState, GroupHost, GroupId};
use crate::kernel::services::ports::{ConfirmChoice, FileResult};
use crate::models::Resource;

use super::ServiceInner;

/// What a group holds of its service: a weak handle, never ownership.
pub(super) struct ServiceHandle {
    inner: Weak<ServiceInner>,
}

impl ServiceHandle {
    pub(super) fn new(inner: Weak<ServiceInner>) -> Self {
        Self { inner }
    }
}

impl GroupHost for ServiceHandle {
    fn group_opened(&self, group: Rc<EditorGroup>, editor: EditorHandle, resource: &Resource) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_open(&group, editor, resource);
        }
    }

    fn group_closed(&self, group: Rc<EditorGroup>, resource: &Resource, was_preview: bool) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_close(&group, resource, was_preview);
        }
    }

    fn confirm_close(
        &self,
        group: GroupId,
        resource: Resource,
    ) -> LocalBoxFuture<'static, FileResult<bool>> {
        let inner = self.inner.upgrade();
        async move {
            match inner {
                Some(inner) => inner.close_guard(group, &resource).await,
                // Nothing left to protect once the service is gone.
                None => Ok(true),
            }
        }
        .boxed_local()
    }
}

impl ServiceInner {
    fn handle_open(&self, group: &Rc<EditorGroup>, editor: EditorHandle, resource: &Resource) {
        self.insert_group(group);
        self.publish_groups();
        self.publish_state(EditorState {
            active_group: Some(group.id()),
            active_editor: Some(editor),
            active_resource: Some(resource.clone()),
            visible_editors: self.visible_editors(),
        });
        self.did_open_tx.send_replace(Some(resource.clone()));
    }

    /// Closing anything resets the global selection. Only when the affected
    /// group emptied out is some other non-empty group picked as active again.
    fn handle_close(&self, group: &Rc<EditorGroup>, resource: &Resource, was_preview: bool) {
        let emptied = group.is_empty();
        if emptied {
            self.remove_group(group.id());
        }

        if !was_preview && !self.is_opened(resource) {
            tracing::debug!(resource = %resource, "releasing resource");
            self.files.close(resource);
        }

        self.publish_groups();
        self.publish_state(EditorState::default());

        if emptied {
            let fallback = self
                .groups
                .borrow()
                .iter()
                .find(|g| !g.is_empty())
                .cloned();
            if let Some(next) = fallback {
                tracing::debug!(group = %next.id(), "fallback group activated");
                self.activate(&next);
            }
        }
    }

    async fn close_guard(&self, group: GroupId, resource: &Resource) -> FileResult<bool> {
        if !self.files.is_dirty(resource) {
            return Ok(true);
        }

        let open_in = self
            .groups
            .borrow()
            .iter()
            .filter(|g| g.contains(resource))
            .count();
        if open_in > 1 {
            return Ok(true);
        }

        let options = self.config.confirm.options_for(&resource.basename());
        let choice = self.dialogs.confirm(&options).await;
        tracing::debug!(group = %group, resource = %resource, ?choice, "close confirmation");

        match choice {
            ConfirmChoice::Cancel => Ok(false),
            ConfirmChoice::DontSave => Ok(true),
            ConfirmChoice::Save => {
                if let Err(err) = self.files.save(resource).await {
                    tracing::warn!(resource = %resource, error = %err, "save before close failed");
                    return Err(err);
                }
                Ok(true)
            }
        }
    }
}
