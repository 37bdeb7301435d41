#![forbid(unsafe_code)]

//! End-to-end workspace flows: dock restore/close, the unsaved-changes
//! dialog, panel buttons, and configuration files.
//!
//! Run:
//!   cargo test -p bladestack --test workspace_flows --features config-file

use bladestack::prelude::*;
use bladestack::{CloseOutcome, DockItem};

struct ReadyNow;

impl BladePanel for ReadyNow {
    fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
        ready.notify();
    }
}

fn open(ws: &mut Workspace, label: &str, now: Instant) {
    let outcome = ws.open_resolved(Ok(Box::new(ReadyNow)), BladeProps::new(), Some(label.into()), now);
    assert!(outcome.is_opened());
}

fn targets(items: &[DockItem]) -> Vec<DockTarget> {
    items.iter().map(|i| i.target.clone()).collect()
}

// --- Capacity ---

#[test]
fn open_on_full_minimized_stack_brings_it_back() {
    let mut ws = Workspace::default();
    let t0 = Instant::now();
    let t1 = t0 + bladestack::Duration::from_secs(1);
    for i in 0..5 {
        open(&mut ws, &format!("b{i}"), t0);
    }
    ws.edit_blades_mut()
        .unwrap()
        .open_blade("e1", None, OpenOptions::new().stack_controlled(true));
    ws.minimize_stack();
    assert_eq!(targets(&ws.dock_items()), vec![DockTarget::Stack]);

    let outcome = ws.open_resolved(Ok(Box::new(ReadyNow)), BladeProps::new(), Some("b5".into()), t1);
    assert_eq!(outcome.kind(), "capacity_exceeded");
    assert!(!ws.stack().is_stack_minimized());
    assert_eq!(ws.stack().stack_count(), 5);
    assert_eq!(ws.stack().stack_label(), "b4");
    let e1 = ws.edit_blades().unwrap().get_blade("e1").unwrap();
    assert!(e1.is_minimized);
    assert_eq!(e1.minimized_at, Some(t1));
    assert_eq!(
        targets(&ws.dock_items()),
        vec![DockTarget::Edit("e1".into())]
    );
}

// --- Dock ---

#[test]
fn minimized_stack_and_registry_blades_share_the_dock() {
    let mut ws = Workspace::default();
    let t0 = Instant::now();
    let t1 = t0 + bladestack::Duration::from_secs(1);
    open(&mut ws, "Reports", t0);
    open(&mut ws, "Detail", t0);
    ws.edit_blades_mut()
        .unwrap()
        .open_blade("e1", Some("Budget"), OpenOptions::new());
    ws.view_blades_mut().unwrap().open_blade("v1", None, OpenOptions::new());
    ws.view_blades_mut().unwrap().minimize_blade("v1", t0);
    ws.edit_blades_mut().unwrap().minimize_blade("e1", t1);
    ws.minimize_stack();

    let items = ws.dock_items();
    assert_eq!(
        targets(&items),
        vec![
            DockTarget::Stack,
            DockTarget::View("v1".into()),
            DockTarget::Edit("e1".into()),
        ]
    );
    assert_eq!(items[0].label, "Detail");
    assert_eq!(ws.dock_layout().slots.len(), 3);

    assert!(ws.dock_restore(&DockTarget::Edit("e1".into())));
    assert!(!ws.edit_blades().unwrap().get_blade("e1").unwrap().is_minimized);
    assert!(ws.stack().is_stack_minimized());
    assert_eq!(ws.dock_items().len(), 2);
}

#[test]
fn dirty_edit_close_needs_confirmation() {
    let mut ws = Workspace::default();
    let now = Instant::now();
    let edit = ws.edit_blades_mut().unwrap();
    edit.open_blade("e1", None, OpenOptions::new());
    edit.set_dirty("e1", true);
    edit.minimize_blade("e1", now);
    let target = DockTarget::Edit("e1".into());

    assert_eq!(ws.dock_close(&target), CloseOutcome::ConfirmationRequired);
    assert!(ws.dock().dialog().is_open());
    assert!(ws.cancel_close());
    assert!(ws.edit_blades().unwrap().get_blade("e1").is_some());

    assert_eq!(ws.dock_close(&target), CloseOutcome::ConfirmationRequired);
    let closed = ws.confirm_close().unwrap();
    assert_eq!(closed.id, "e1");
    assert!(ws.edit_blades().unwrap().is_empty());
    assert!(!ws.dock().dialog().is_open());
}

#[test]
fn dock_close_button_click_opens_the_dialog() {
    let mut ws = Workspace::default().with_viewport(Viewport::new(1280, 800));
    let now = Instant::now();
    let edit = ws.edit_blades_mut().unwrap();
    edit.open_blade("e1", None, OpenOptions::new());
    edit.set_dirty("e1", true);
    edit.minimize_blade("e1", now);

    let close = ws.dock_layout().slots[0].close_button.unwrap();
    let action = ws.handle_event(&Event::click(close.x + 1, close.y + 1));
    assert_eq!(
        action,
        Some(WorkspaceAction::DockClosed(CloseOutcome::ConfirmationRequired))
    );
    assert_eq!(
        ws.handle_event(&Event::key(KeyCode::Escape)),
        Some(WorkspaceAction::DialogCancelled)
    );
    assert!(ws.edit_blades().unwrap().get_blade("e1").is_some());
}

// --- Escape ---

#[test]
fn escape_closes_one_blade_at_a_time() {
    let mut ws = Workspace::default();
    let now = Instant::now();
    for label in ["A", "B", "C"] {
        open(&mut ws, label, now);
    }
    let escape = Event::key(KeyCode::Escape);
    for remaining in (0..3).rev() {
        assert!(matches!(
            ws.handle_event(&escape),
            Some(WorkspaceAction::Stack(StackAction::Closed(_)))
        ));
        assert_eq!(ws.stack().stack_count(), remaining);
    }
    assert_eq!(ws.handle_event(&escape), None);
}

#[test]
fn escape_is_ignored_while_stack_is_minimized() {
    let mut ws = Workspace::default();
    open(&mut ws, "A", Instant::now());
    ws.minimize_stack();
    assert_eq!(ws.handle_event(&Event::key(KeyCode::Escape)), None);
    assert_eq!(ws.stack().stack_count(), 1);
}

// --- Standalone blades ---

#[test]
fn standalone_layer_sits_above_active_blade() {
    let mut ws = Workspace::default();
    open(&mut ws, "A", Instant::now());
    let layer = ws.standalone_layer(None);
    assert_eq!(layer.z_index, 1005);
    assert_eq!(layer.overlay_z_index, 1004);
    assert_eq!(ws.standalone_layer(Some(77)).z_index, 77);
}

// --- Configuration ---

#[cfg(feature = "config-file")]
mod config_file {
    use super::*;
    use std::io::Write;

    #[test]
    fn workspace_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack]\nmax_depth = 2\n\n[registry]\nz_start = 500").unwrap();

        let mut ws = Workspace::from_toml_file(file.path()).unwrap();
        assert_eq!(ws.config().stack.max_depth, 2);
        let now = Instant::now();
        open(&mut ws, "A", now);
        open(&mut ws, "B", now);
        let third = ws.open_resolved(Ok(Box::new(ReadyNow)), BladeProps::new(), None, now);
        assert_eq!(third.kind(), "capacity_exceeded");

        let result = ws
            .edit_blades_mut()
            .unwrap()
            .open_blade("e1", None, OpenOptions::new());
        assert_eq!(result.z_index(), 502);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack]\nmax_depth = 0").unwrap();
        let err = Workspace::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("max_depth"));
    }
}
