use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use rustc_hash::FxHashSet;

use crate::kernel::error::{OpenError, RegistryError};
use crate::models::Resource;

/// An editor kind. Registered values act as prototypes: every group gets its own
/// instances through [`Editor::instantiate`].
pub trait Editor {
    fn name(&self) -> &str;

    fn can_handle(&self, resource: &Resource) -> bool;

    fn instantiate(&self) -> Box<dyn Editor>;

    /// Prepares this instance to show `resource`.
    fn open<'a>(&'a self, resource: &'a Resource) -> LocalBoxFuture<'a, Result<(), OpenError>> {
        let _ = resource;
        future::ready(Ok(())).boxed_local()
    }
}

/// Editor prototypes, most recently registered first.
#[derive(Default)]
pub struct EditorRegistry {
    editors: Vec<Box<dyn Editor>>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a batch of editors. Nothing is registered if any name collides,
    /// either with an existing editor or within the batch.
    pub fn register<I>(&mut self, editors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Box<dyn Editor>>,
    {
        let editors: Vec<Box<dyn Editor>> = editors.into_iter().collect();

        let mut batch = FxHashSet::default();
        for editor in &editors {
            let name = editor.name();
            if self.contains(name) || !batch.insert(name.to_string()) {
                return Err(RegistryError::DuplicateEditor(name.to_string()));
            }
        }

        for editor in editors {
            tracing::info!(editor = editor.name(), "editor registered");
            self.editors.insert(0, editor);
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.editors.iter().any(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Names in resolution order.
    pub fn names(&self) -> Vec<&str> {
        self.editors.iter().map(|e| e.name()).collect()
    }

    pub fn resolve(&self, resource: &Resource) -> Option<&dyn Editor> {
        self.editors
            .iter()
            .find(|e| e.can_handle(resource))
            .map(|e| e.as_ref())
    }

    /// Fresh instances of every registered editor, in resolution order.
    pub fn instantiate_all(&self) -> Vec<Rc<dyn Editor>> {
        self.editors
            .iter()
            .map(|e| Rc::from(e.instantiate()))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/registry.rs"]
mod tests;
