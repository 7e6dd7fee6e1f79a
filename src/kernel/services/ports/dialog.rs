use futures::future::LocalBoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Save,
    DontSave,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub label: String,
    pub choice: ConfirmChoice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOptions {
    pub title: String,
    pub message: String,
    pub buttons: Vec<DialogButton>,
    pub default_button: String,
    pub cancel_button: String,
}

impl ConfirmOptions {
    pub fn choice_for_label(&self, label: &str) -> Option<ConfirmChoice> {
        let label = label.trim();
        self.buttons
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(label))
            .map(|b| b.choice)
    }

    pub fn default_choice(&self) -> ConfirmChoice {
        self.choice_for_label(&self.default_button)
            .unwrap_or(ConfirmChoice::Cancel)
    }

    pub fn cancel_choice(&self) -> ConfirmChoice {
        self.choice_for_label(&self.cancel_button)
            .unwrap_or(ConfirmChoice::Cancel)
    }
}

/// Confirmation UI. Resolves once the user picks a button; there is no timeout.
pub trait DialogService {
    fn confirm<'a>(&'a self, options: &'a ConfirmOptions) -> LocalBoxFuture<'a, ConfirmChoice>;
}
