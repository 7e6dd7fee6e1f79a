use futures::future::join_all;

use crate::kernel::editor::{EditorState, GroupId};
use crate::kernel::services::ports::FileResult;
use crate::models::Resource;

use super::EditorService;

impl EditorService {
    /// Closes `resource` in every group showing it, concurrently. Each entry
    /// reports whether that group actually dropped the tab; a vetoed close
    /// leaves the tab in place. Unopened resources yield an empty list.
    ///
    /// Every group's close runs to completion; the first save failure is then
    /// returned.
    pub async fn close(
        &self,
        resource: &Resource,
        force: bool,
    ) -> FileResult<Vec<(GroupId, bool)>> {
        let targets = self.find_groups(|g| g.contains(resource));
        join_all(targets.iter().map(|group| async move {
            group.close(resource, force).await.map(|closed| (group.id(), closed))
        }))
        .await
        .into_iter()
        .collect()
    }

    /// Closes every group, one at a time, re-reading the live group list after
    /// each one. Returns `Ok(false)` if a close was vetoed and the save error if
    /// one failed; either way the remaining groups and tabs are left as they are.
    pub async fn close_all(&self, force: bool) -> FileResult<bool> {
        loop {
            let Some(group) = self.inner.groups.borrow().first().cloned() else {
                break;
            };
            if !group.close_all(force).await? {
                tracing::debug!(group = %group.id(), "close all interrupted");
                return Ok(false);
            }
            if group.is_empty() && self.inner.remove_group(group.id()) {
                self.inner.publish_groups();
            }
        }

        self.inner.groups.borrow_mut().clear();
        self.inner.publish_groups();
        self.inner.publish_state(EditorState::default());
        Ok(true)
    }

    /// Saves every dirty resource shown in any group. All saves run to
    /// completion; the first failure is returned afterwards.
    pub async fn save_all(&self) -> FileResult<()> {
        let files = &self.inner.files;
        let mut dirty: Vec<Resource> = Vec::new();
        for group in self.inner.groups.borrow().iter() {
            for resource in group.resources() {
                if files.is_dirty(&resource) && !dirty.contains(&resource) {
                    dirty.push(resource);
                }
            }
        }

        tracing::debug!(count = dirty.len(), "saving dirty resources");
        join_all(dirty.iter().map(|resource| files.save(resource)))
            .await
            .into_iter()
            .collect()
    }

    pub async fn save_active_resource(&self) -> FileResult<()> {
        let Some(resource) = self.state().active_resource else {
            return Ok(());
        };
        self.inner.files.save(&resource).await
    }
}
