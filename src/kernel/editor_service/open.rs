use std::rc::Rc;

use crate::kernel::editor::{EditorGroup, EditorHandle, OpenOptions, TabSpec};
use crate::kernel::error::OpenError;
use crate::models::Resource;

use super::EditorService;

impl EditorService {
    /// Opens `resource`, choosing or creating the target group.
    ///
    /// Preview opens prefer the group already previewing the resource, then any
    /// inactive group. Side opens always get a new group. Plain opens go to the
    /// requested group, a group showing the resource, the active group, or the
    /// first group, in that order.
    ///
    /// The chosen group is published before the open is awaited, so subscribers
    /// can see a freshly created group while its first tab is still loading. If
    /// the open fails and leaves that group empty, the group is dropped again.
    pub async fn open(
        &self,
        resource: Resource,
        options: OpenOptions,
    ) -> Result<EditorHandle, OpenError> {
        let group = self.target_group(&resource, &options);
        self.inner.insert_group(&group);
        self.inner.publish_groups();

        self.inner.will_open_tx.send_replace(Some(resource.clone()));

        let spec = self.tab_spec(&resource, &options);
        tracing::debug!(
            group = %group.id(),
            resource = %resource,
            preview = options.preview,
            "opening"
        );

        let result = group.open(resource, spec).await;
        if let Err(err) = &result {
            tracing::warn!(group = %group.id(), error = %err, "open failed");
            if group.is_empty() && self.inner.remove_group(group.id()) {
                self.inner.publish_groups();
            }
        }
        result
    }

    /// Picks (or creates, unregistered) the group an open request lands in.
    pub(crate) fn target_group(&self, resource: &Resource, options: &OpenOptions) -> Rc<EditorGroup> {
        let groups = self.inner.groups.borrow().clone();
        let active = self.inner.state_tx.borrow().active_group;

        if options.preview {
            if let Some(group) = groups.iter().find(|g| g.contains_preview(resource)) {
                return Rc::clone(group);
            }
            if let Some(group) = groups.iter().find(|g| Some(g.id()) != active) {
                return Rc::clone(group);
            }
            return self.inner.create_group();
        }

        if options.open_to_side {
            return self.inner.create_group();
        }

        let explicit = options
            .group
            .and_then(|id| groups.iter().find(|g| g.id() == id));
        let containing = || groups.iter().find(|g| g.contains(resource));
        let current = || {
            active.and_then(|id| groups.iter().find(|g| g.id() == id))
        };

        explicit
            .or_else(containing)
            .or_else(current)
            .or_else(|| groups.first())
            .cloned()
            .unwrap_or_else(|| self.inner.create_group())
    }

    fn tab_spec(&self, resource: &Resource, options: &OpenOptions) -> TabSpec {
        let config = &self.inner.config;
        let title = options
            .title
            .clone()
            .unwrap_or_else(|| resource.basename());
        let title = if options.preview {
            config.preview_title(&title)
        } else {
            title
        };
        let icon = options
            .icon
            .clone()
            .or_else(|| options.preview.then(|| config.preview_icon.clone()));

        TabSpec {
            title,
            icon,
            tooltip: resource.to_string(),
            preview: options.preview,
        }
    }
}
