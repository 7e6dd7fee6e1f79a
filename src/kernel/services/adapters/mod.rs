//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod dialog;
pub mod file;
pub mod file_watcher;
pub mod settings;

pub use dialog::{PromptDialog, ScriptedDialog};
pub use file::{LocalFileLayer, MemoryFileLayer};
pub use file_watcher::{FileWatcher, WatchEvent};
pub use settings::{
    ensure_log_dir, ensure_settings_file, get_log_dir, get_settings_path, load_settings,
};
