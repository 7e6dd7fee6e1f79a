use super::*;
use crate::kernel::editor::{ExtensionEditor, OpenOptions, TextEditor};
use crate::kernel::error::OpenError;
use crate::kernel::services::adapters::{MemoryFileLayer, ScriptedDialog};
use crate::kernel::services::ports::{ConfirmChoice, FileError};

struct Fixture {
    service: EditorService,
    files: Rc<MemoryFileLayer>,
    dialog: Rc<ScriptedDialog>,
}

fn fixture_with(dialog: ScriptedDialog) -> Fixture {
    let files = Rc::new(MemoryFileLayer::new());
    let dialog = Rc::new(dialog);
    let service = EditorService::new(
        Rc::clone(&files) as Rc<dyn FileLayer>,
        Rc::clone(&dialog) as Rc<dyn DialogService>,
        WorkbenchConfig::default(),
    );
    let editors: Vec<Box<dyn Editor>> = vec![
        Box::new(TextEditor::new()),
        Box::new(ExtensionEditor::markdown()),
    ];
    service.register_editors(editors).unwrap();
    Fixture {
        service,
        files,
        dialog,
    }
}

fn fixture() -> Fixture {
    fixture_with(ScriptedDialog::always(ConfirmChoice::Cancel))
}

fn res(uri: &str) -> Resource {
    Resource::parse(uri).unwrap()
}

fn assert_visible_editors_consistent(service: &EditorService) {
    let state = service.state();
    let live = service.find_groups(|_| true);
    assert!(state.visible_editors.len() <= live.len());
    for editor in &state.visible_editors {
        let group = live
            .iter()
            .find(|g| g.id() == editor.group())
            .expect("visible editor belongs to a live group");
        assert_eq!(group.active_editor().as_ref(), Some(editor));
    }
}

#[test]
fn duplicate_registration_is_reported_to_the_caller() {
    let fx = fixture();
    let again: Vec<Box<dyn Editor>> = vec![Box::new(TextEditor::new())];
    let err = fx.service.register_editors(again).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEditor(name) if name == "text"));
    assert_eq!(fx.service.registered_editors(), vec!["markdown", "text"]);
}

#[tokio::test]
async fn open_on_empty_workbench_creates_group_with_titled_tab() {
    let fx = fixture();
    let a = res("file:///a.md");

    let editor = fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    assert_eq!(editor.name(), "markdown");
    let groups = fx.service.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].tabs.len(), 1);
    assert_eq!(groups[0].tabs[0].title, "a.md");
    assert_eq!(groups[0].tabs[0].tooltip, "file:///a.md");

    let state = fx.service.state();
    assert_eq!(state.active_resource, Some(a));
    assert_eq!(state.active_group, Some(groups[0].id));
    assert_eq!(state.active_editor, Some(editor));
    assert_eq!(state.visible_editors.len(), 1);
}

#[tokio::test]
async fn open_to_side_creates_second_group_and_two_visible_editors() {
    let fx = fixture();
    fx.service
        .open(res("file:///a.md"), OpenOptions::default())
        .await
        .unwrap();
    fx.service
        .open(res("file:///b.md"), OpenOptions::to_side())
        .await
        .unwrap();

    assert_eq!(fx.service.group_count(), 2);
    let state = fx.service.state();
    assert_eq!(state.visible_editors.len(), 2);
    assert_eq!(state.active_resource, Some(res("file:///b.md")));
    assert_visible_editors_consistent(&fx.service);
}

#[tokio::test]
async fn plain_open_reuses_active_group_and_existing_tab() {
    let fx = fixture();
    let a = res("file:///a.txt");
    let first = fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service
        .open(res("file:///b.txt"), OpenOptions::default())
        .await
        .unwrap();
    let again = fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    assert_eq!(fx.service.group_count(), 1);
    assert_eq!(first, again);
    let groups = fx.service.groups();
    assert_eq!(groups[0].tabs.len(), 2);
    assert_eq!(groups[0].active_tab().map(|t| &t.resource), Some(&a));
}

#[tokio::test]
async fn explicit_group_wins_over_active_group() {
    let fx = fixture();
    let left = fx
        .service
        .open(res("file:///a.txt"), OpenOptions::default())
        .await
        .unwrap()
        .group();
    fx.service
        .open(res("file:///b.txt"), OpenOptions::to_side())
        .await
        .unwrap();

    let editor = fx
        .service
        .open(res("file:///c.txt"), OpenOptions::in_group(left))
        .await
        .unwrap();

    assert_eq!(editor.group(), left);
    assert!(fx.service.is_active_group(left));
}

#[tokio::test]
async fn preview_replaces_existing_preview_tab() {
    let fx = fixture();
    fx.service
        .open(res("file:///a.txt"), OpenOptions::default())
        .await
        .unwrap();
    fx.service
        .open(res("file:///p1.txt"), OpenOptions::to_side())
        .await
        .unwrap();
    let left = fx.service.groups()[0].id;
    fx.service.set_active_group(left);

    fx.service
        .open(res("file:///p2.txt"), OpenOptions::preview())
        .await
        .unwrap();
    let preview_group = fx
        .service
        .find_group(|g| g.preview_resource().is_some())
        .unwrap();
    let count = preview_group.len();
    // Preview opens go to an inactive group, so keep the left one focused.
    fx.service.set_active_group(left);

    fx.service
        .open(res("file:///p3.txt"), OpenOptions::preview())
        .await
        .unwrap();

    assert_eq!(preview_group.len(), count);
    assert_eq!(
        preview_group.preview_resource(),
        Some(res("file:///p3.txt"))
    );
    assert!(!fx.service.is_opened(&res("file:///p2.txt")));
}

#[tokio::test]
async fn preview_tab_title_carries_marker_and_icon() {
    let fx = fixture();
    fx.service
        .open(res("file:///notes.md"), OpenOptions::preview())
        .await
        .unwrap();

    let config = WorkbenchConfig::default();
    let tab = fx.service.groups()[0].tabs[0].clone();
    assert!(tab.preview);
    assert_eq!(tab.title, config.preview_title("notes.md"));
    assert_eq!(tab.icon, Some(config.preview_icon.clone()));
}

#[tokio::test]
async fn plain_open_promotes_preview_tab() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::preview()).await.unwrap();
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    let tab = fx.service.groups()[0].tabs[0].clone();
    assert!(!tab.preview);
    assert_eq!(tab.title, "a.md");
}

#[tokio::test]
async fn dirty_close_cancel_keeps_tab() {
    let fx = fixture_with(ScriptedDialog::new([ConfirmChoice::Cancel], ConfirmChoice::Cancel));
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.files.mark_dirty(&a);
    let before = fx.service.groups();

    let results = fx.service.close(&a, false).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].1);
    assert_eq!(fx.dialog.prompt_count(), 1);
    assert!(fx.dialog.prompts()[0].message.contains("a.md"));
    assert_eq!(fx.service.groups(), before);
    assert!(fx.files.saved().is_empty());
}

#[tokio::test]
async fn dirty_close_save_persists_then_removes_tab() {
    let fx = fixture_with(ScriptedDialog::always(ConfirmChoice::Save));
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.files.mark_dirty(&a);

    let results = fx.service.close(&a, false).await.unwrap();

    assert_eq!(results, vec![(results[0].0, true)]);
    assert_eq!(fx.files.saved(), vec![a.clone()]);
    assert!(!fx.service.is_opened(&a));
    assert_eq!(fx.service.group_count(), 0);
    assert_eq!(fx.files.closed(), vec![a]);
}

#[tokio::test]
async fn failed_save_in_close_guard_is_returned_to_caller() {
    let fx = fixture_with(ScriptedDialog::always(ConfirmChoice::Save));
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.files.mark_dirty(&a);
    fx.files.fail_saves_for(&a);

    let err = fx.service.close(&a, false).await.unwrap_err();

    assert!(matches!(err, FileError::Io(_)));
    assert!(fx.service.is_opened(&a));
    assert!(fx.files.is_dirty(&a));
    assert!(fx.files.closed().is_empty());

    assert!(fx.service.close_all(false).await.is_err());
    assert_eq!(fx.service.group_count(), 1);
}

#[tokio::test]
async fn dont_save_closes_without_saving() {
    let fx = fixture_with(ScriptedDialog::always(ConfirmChoice::DontSave));
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.files.mark_dirty(&a);

    fx.service.close(&a, false).await.unwrap();

    assert!(!fx.service.is_opened(&a));
    assert!(fx.files.saved().is_empty());
}

#[tokio::test]
async fn dirty_resource_in_two_groups_closes_without_prompt() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    let right = fx
        .service
        .open(a.clone(), OpenOptions::to_side())
        .await
        .unwrap()
        .group();
    fx.files.mark_dirty(&a);

    let group = fx.service.find_group_by_id(right).unwrap();
    assert!(group.close(&a, false).await.unwrap());

    assert_eq!(fx.dialog.prompt_count(), 0);
    assert!(fx.service.is_opened(&a));
    assert_eq!(fx.service.find_groups(|g| g.contains(&a)).len(), 1);
    assert!(fx.files.closed().is_empty());
}

#[tokio::test]
async fn close_unopened_resource_is_empty_noop() {
    let fx = fixture();
    fx.service
        .open(res("file:///a.md"), OpenOptions::default())
        .await
        .unwrap();

    let results = fx.service.close(&res("file:///missing.md"), false).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(fx.service.group_count(), 1);
}

#[tokio::test]
async fn close_all_force_clears_every_group() {
    let fx = fixture();
    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        let options = if i == 0 {
            OpenOptions::default()
        } else {
            OpenOptions::to_side()
        };
        let group = fx
            .service
            .open(res(&format!("file:///{name}1.md")), options)
            .await
            .unwrap()
            .group();
        fx.service
            .open(res(&format!("file:///{name}2.md")), OpenOptions::in_group(group))
            .await
            .unwrap();
    }
    for group in fx.service.find_groups(|_| true) {
        for resource in group.resources() {
            fx.files.mark_dirty(&resource);
        }
    }

    assert!(fx.service.close_all(true).await.unwrap());

    assert_eq!(fx.service.group_count(), 0);
    assert!(fx.service.groups().is_empty());
    assert!(fx.service.state().is_cleared());
    assert_eq!(fx.dialog.prompt_count(), 0);
}

#[tokio::test]
async fn close_all_stops_at_vetoed_close() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service
        .open(res("file:///b.md"), OpenOptions::to_side())
        .await
        .unwrap();
    fx.files.mark_dirty(&a);

    assert!(!fx.service.close_all(false).await.unwrap());
    assert!(fx.service.is_opened(&a));
    assert_eq!(fx.service.group_count(), 2);
}

#[tokio::test]
async fn deletion_event_force_closes_everywhere() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service.open(a.clone(), OpenOptions::to_side()).await.unwrap();
    fx.files.mark_dirty(&a);

    fx.service.handle_file_event(FileEvent::Deleted(a.clone())).await;

    assert!(!fx.service.is_opened(&a));
    assert_eq!(fx.dialog.prompt_count(), 0);
    assert_eq!(fx.service.group_count(), 0);
}

#[tokio::test]
async fn changed_event_keeps_tabs() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    fx.service.handle_file_event(FileEvent::Changed(a.clone())).await;

    assert!(fx.service.is_opened(&a));
}

#[tokio::test]
async fn run_file_events_closes_deleted_resource() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    let service = fx.service.clone();
    let files = Rc::clone(&fx.files);
    let deleted = a.clone();
    let trigger = async move {
        tokio::task::yield_now().await;
        files.delete(&deleted);
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    };
    tokio::select! {
        _ = service.run_file_events() => {}
        _ = trigger => {}
    }

    assert!(!fx.service.is_opened(&a));
}

#[tokio::test]
async fn close_clears_state_then_falls_back_to_non_empty_group() {
    let fx = fixture();
    let a = res("file:///a.md");
    let b = res("file:///b.md");
    let left = fx.service.open(a.clone(), OpenOptions::default()).await.unwrap().group();
    fx.service.open(b.clone(), OpenOptions::to_side()).await.unwrap();
    let rx = fx.service.subscribe_state();

    fx.service.close(&b, true).await.unwrap();

    assert!(rx.has_changed().unwrap());
    let state = fx.service.state();
    assert_eq!(state.active_group, Some(left));
    assert_eq!(state.active_resource, Some(a));
    assert_visible_editors_consistent(&fx.service);
}

#[tokio::test]
async fn close_in_surviving_group_leaves_state_cleared() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service
        .open(res("file:///b.md"), OpenOptions::default())
        .await
        .unwrap();

    fx.service.close(&a, true).await.unwrap();

    assert_eq!(fx.service.group_count(), 1);
    assert!(fx.service.state().is_cleared());
}

#[tokio::test]
async fn will_and_did_open_notifications_fire() {
    let fx = fixture();
    let mut will = fx.service.subscribe_will_open();
    let mut did = fx.service.subscribe_did_open();
    let a = res("file:///a.md");

    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();

    assert!(will.has_changed().unwrap());
    assert!(did.has_changed().unwrap());
    assert_eq!(*will.borrow_and_update(), Some(a.clone()));
    assert_eq!(*did.borrow_and_update(), Some(a));
}

#[tokio::test]
async fn new_group_is_published_before_open_completes() {
    let fx = fixture();
    let groups = fx.service.subscribe_groups();
    let open = fx.service.open(res("file:///a.md"), OpenOptions::default());
    futures::pin_mut!(open);

    // First poll runs up to the editor's open; the group is already visible.
    let polled = futures::poll!(open.as_mut());
    assert_eq!(groups.borrow().len(), 1);
    if polled.is_pending() {
        open.await.unwrap();
    }
    assert_eq!(groups.borrow()[0].tabs.len(), 1);
}

#[tokio::test]
async fn failed_open_removes_the_new_group() {
    let files = Rc::new(MemoryFileLayer::new());
    let service = EditorService::new(
        Rc::clone(&files) as Rc<dyn FileLayer>,
        Rc::new(ScriptedDialog::always(ConfirmChoice::Cancel)) as Rc<dyn DialogService>,
        WorkbenchConfig::default(),
    );
    let editors: Vec<Box<dyn Editor>> = vec![Box::new(ExtensionEditor::markdown())];
    service.register_editors(editors).unwrap();

    let err = service
        .open(res("file:///a.txt"), OpenOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, OpenError::NoEditor(_)));
    assert_eq!(service.group_count(), 0);
    assert!(service.groups().is_empty());
}

#[tokio::test]
async fn preview_close_does_not_release_resource() {
    let fx = fixture();
    let a = res("file:///a.md");
    fx.service.open(a.clone(), OpenOptions::preview()).await.unwrap();

    fx.service.close(&a, true).await.unwrap();

    assert!(fx.files.closed().is_empty());
}

#[tokio::test]
async fn save_all_saves_each_dirty_resource_once() {
    let fx = fixture();
    let a = res("file:///a.md");
    let b = res("file:///b.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service.open(b.clone(), OpenOptions::default()).await.unwrap();
    fx.service.open(a.clone(), OpenOptions::to_side()).await.unwrap();
    fx.files.mark_dirty(&a);

    fx.service.save_all().await.unwrap();

    assert_eq!(fx.files.saved(), vec![a.clone()]);
    assert!(!fx.files.is_dirty(&a));
}

#[tokio::test]
async fn save_all_finishes_other_saves_when_one_fails() {
    let fx = fixture();
    let a = res("file:///a.md");
    let b = res("file:///b.md");
    fx.service.open(a.clone(), OpenOptions::default()).await.unwrap();
    fx.service.open(b.clone(), OpenOptions::default()).await.unwrap();
    fx.files.mark_dirty(&a);
    fx.files.mark_dirty(&b);
    fx.files.fail_saves_for(&a);

    assert!(fx.service.save_all().await.is_err());

    assert_eq!(fx.files.saved(), vec![b.clone()]);
    assert!(!fx.files.is_dirty(&b));
    assert!(fx.files.is_dirty(&a));
}

#[tokio::test]
async fn save_active_resource_saves_only_the_focused_one() {
    let fx = fixture();
    fx.service.save_active_resource().await.unwrap();
    assert!(fx.files.saved().is_empty());

    let b = res("file:///b.md");
    fx.service
        .open(res("file:///a.md"), OpenOptions::default())
        .await
        .unwrap();
    fx.service.open(b.clone(), OpenOptions::default()).await.unwrap();

    fx.service.save_active_resource().await.unwrap();
    assert_eq!(fx.files.saved(), vec![b]);
}

#[tokio::test]
async fn activate_tab_and_set_active_group_republish_state() {
    let fx = fixture();
    let a = res("file:///a.md");
    let left = fx.service.open(a.clone(), OpenOptions::default()).await.unwrap().group();
    fx.service
        .open(res("file:///b.md"), OpenOptions::default())
        .await
        .unwrap();
    let right = fx
        .service
        .open(res("file:///c.md"), OpenOptions::to_side())
        .await
        .unwrap()
        .group();
    assert!(fx.service.is_active_group(right));

    assert!(fx.service.set_active_group(left));
    assert_eq!(fx.service.state().active_resource, Some(res("file:///b.md")));

    assert!(fx.service.activate_tab(left, 0));
    assert_eq!(fx.service.state().active_resource, Some(a));
    assert_eq!(fx.service.groups()[0].active, Some(0));

    assert!(!fx.service.set_active_group(GroupId::new(99)));
    assert!(!fx.service.activate_tab(GroupId::new(99), 0));
}

#[tokio::test]
async fn visible_editors_stay_consistent_across_operations() {
    let fx = fixture();
    let names = ["a.md", "b.txt", "c.md", "d.txt"];
    for (i, name) in names.iter().enumerate() {
        let options = match i % 3 {
            0 => OpenOptions::default(),
            1 => OpenOptions::to_side(),
            _ => OpenOptions::preview(),
        };
        fx.service
            .open(res(&format!("file:///{name}")), options)
            .await
            .unwrap();
        assert_visible_editors_consistent(&fx.service);
    }
    for name in names {
        fx.service.close(&res(&format!("file:///{name}")), true).await.unwrap();
        assert_visible_editors_consistent(&fx.service);
    }
    assert_eq!(fx.service.group_count(), 0);
}

#[test]
fn groups_do_not_keep_the_service_alive() {
    let fx = fixture();
    let weak = Rc::downgrade(&fx.service.inner);
    let group = fx.service.inner.create_group();
    drop(fx);
    assert!(weak.upgrade().is_none());
    assert_eq!(group.id(), GroupId::new(1));
}
