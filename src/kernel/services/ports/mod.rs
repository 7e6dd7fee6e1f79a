//! Service ports: traits + data contracts.

pub mod config;
pub mod dialog;
pub mod file;

pub use config::{ConfirmTexts, WorkbenchConfig};
pub use dialog::{ConfirmChoice, ConfirmOptions, DialogButton, DialogService};
pub use file::{FileError, FileEvent, FileLayer, Result as FileResult};
