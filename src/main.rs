//! Workbench binary.
//!
//! Opens the given files into editor groups, prints the resulting layout and
//! selection, then closes everything (asking to save modified documents).

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use workbench::kernel::services::adapters::{
    ensure_settings_file, load_settings, LocalFileLayer, PromptDialog, ScriptedDialog,
};
use workbench::kernel::services::ports::{
    ConfirmChoice, DialogService, FileLayer, WorkbenchConfig,
};
use workbench::kernel::{
    Editor, EditorService, ExtensionEditor, OpenOptions, TextEditor, WorkbenchError,
};
use workbench::models::Resource;

mod logging;

/// Workbench command line arguments.
#[derive(Parser, Debug)]
#[command(name = "workbench")]
#[command(about = "Open files into editor groups and report the layout")]
struct Args {
    /// Files to open
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Open every path after the first in a new side group
    #[arg(long)]
    side: bool,

    /// Open as preview tabs
    #[arg(long)]
    preview: bool,

    /// Append TEXT to the first file, leaving it modified
    #[arg(long, value_name = "TEXT")]
    edit: Option<String>,

    /// Close without asking to save
    #[arg(short, long)]
    force: bool,

    /// Also log to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _logging = logging::init(args.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("workbench: cannot start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "workbench failed");
            eprintln!("workbench: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), WorkbenchError> {
    let config = load_config();
    let files = Rc::new(LocalFileLayer::new());
    let dialogs: Rc<dyn DialogService> = if std::io::stdin().is_terminal() {
        Rc::new(PromptDialog::new())
    } else {
        Rc::new(ScriptedDialog::always(ConfirmChoice::DontSave))
    };

    let service = EditorService::new(Rc::clone(&files) as Rc<dyn FileLayer>, dialogs, config);
    let editors: Vec<Box<dyn Editor>> = vec![
        Box::new(TextEditor::new()),
        Box::new(ExtensionEditor::markdown()),
    ];
    service.register_editors(editors)?;

    let cwd = std::env::current_dir()?;
    if let Err(err) = files.watch(&cwd) {
        tracing::warn!(error = %err, "file watching unavailable");
    }
    let mut file_events = files.subscribe();

    let mut first = None;
    for (index, path) in args.paths.iter().enumerate() {
        let resource = resource_for(&cwd, path)?;
        files.load(&resource).await?;
        let options = OpenOptions {
            preview: args.preview,
            open_to_side: args.side && index > 0,
            ..OpenOptions::default()
        };
        service.open(resource.clone(), options).await?;
        first.get_or_insert(resource);
    }

    if let (Some(text), Some(resource)) = (args.edit.as_deref(), first.as_ref()) {
        files.insert(resource, usize::MAX, text)?;
    }

    files.pump_watcher();
    while let Ok(event) = file_events.try_recv() {
        service.handle_file_event(event).await;
    }

    print_layout(&service, &files);

    if !service.close_all(args.force).await? {
        println!(
            "close cancelled, {} group(s) left open",
            service.group_count()
        );
    }
    Ok(())
}

fn load_config() -> WorkbenchConfig {
    if let Err(err) = ensure_settings_file() {
        tracing::warn!(error = %err, "cannot create settings file");
    }
    load_settings().unwrap_or_default()
}

fn resource_for(cwd: &Path, path: &Path) -> Result<Resource, WorkbenchError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    Resource::from_file_path(&absolute)
        .ok_or_else(|| WorkbenchError::InvalidResource(absolute.display().to_string()))
}

fn print_layout(service: &EditorService, files: &LocalFileLayer) {
    for group in service.groups() {
        let marker = if service.is_active_group(group.id) { " (active)" } else { "" };
        println!("{}{}", group.id, marker);
        for (index, tab) in group.tabs.iter().enumerate() {
            let current = if group.active == Some(index) { '>' } else { ' ' };
            let dirty = if files.is_dirty(&tab.resource) { " [modified]" } else { "" };
            println!(
                "  {current} {} [{}]{dirty}  {}",
                tab.title,
                tab.editor.name(),
                tab.tooltip
            );
        }
    }

    let state = service.state();
    match &state.active_resource {
        Some(resource) => println!("active: {resource}"),
        None => println!("active: none"),
    }
    println!("visible editors: {}", state.visible_editors.len());
}
