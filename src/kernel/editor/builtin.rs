//! Stock editor kinds.

use crate::models::Resource;

use super::registry::Editor;

/// Fallback editor claiming every resource.
#[derive(Debug, Clone, Default)]
pub struct TextEditor;

impl TextEditor {
    pub const NAME: &'static str = "text";

    pub fn new() -> Self {
        Self
    }
}

impl Editor for TextEditor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn can_handle(&self, _resource: &Resource) -> bool {
        true
    }

    fn instantiate(&self) -> Box<dyn Editor> {
        Box::new(Self::new())
    }
}

/// Claims resources by file extension.
#[derive(Debug, Clone)]
pub struct ExtensionEditor {
    name: String,
    extensions: Vec<String>,
}

impl ExtensionEditor {
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn markdown() -> Self {
        Self::new("markdown", ["md", "markdown"])
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Editor for ExtensionEditor {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, resource: &Resource) -> bool {
        resource
            .extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    fn instantiate(&self) -> Box<dyn Editor> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor/builtin.rs"]
mod tests;
