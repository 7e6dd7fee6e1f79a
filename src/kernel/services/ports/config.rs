use serde::{Deserialize, Serialize};

use super::dialog::{ConfirmChoice, ConfirmOptions, DialogButton};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Prepended to the title of tabs opened in preview mode.
    pub preview_marker: String,
    pub preview_icon: String,
    pub confirm: ConfirmTexts,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            preview_marker: "\u{25e6} ".to_string(),
            preview_icon: "preview".to_string(),
            confirm: ConfirmTexts::default(),
        }
    }
}

impl WorkbenchConfig {
    pub fn preview_title(&self, title: &str) -> String {
        format!("{}{}", self.preview_marker, title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmTexts {
    pub title: String,
    /// `{name}` is replaced with the resource basename.
    pub message: String,
    pub save: String,
    pub dont_save: String,
    pub cancel: String,
}

impl Default for ConfirmTexts {
    fn default() -> Self {
        Self {
            title: "Unsaved Changes".to_string(),
            message: "Do you want to save the changes you made to {name}?".to_string(),
            save: "Save".to_string(),
            dont_save: "Don't Save".to_string(),
            cancel: "Cancel".to_string(),
        }
    }
}

impl ConfirmTexts {
    pub fn options_for(&self, name: &str) -> ConfirmOptions {
        ConfirmOptions {
            title: self.title.clone(),
            message: self.message.replace("{name}", name),
            buttons: vec![
                DialogButton {
                    label: self.save.clone(),
                    choice: ConfirmChoice::Save,
                },
                DialogButton {
                    label: self.dont_save.clone(),
                    choice: ConfirmChoice::DontSave,
                },
                DialogButton {
                    label: self.cancel.clone(),
                    choice: ConfirmChoice::Cancel,
                },
            ],
            default_button: self.save.clone(),
            cancel_button: self.cancel.clone(),
        }
    }
}
