#![forbid(unsafe_code)]

//! Dock items and restore/close actions.

use blade_core::{BladeType, DockConfig, Event, Viewport};
use blade_registry::{BladeRegistry, BladeState, EditBlades, RegistryKind, ViewBlades};
use blade_stack::BladeStack;
use web_time::Instant;

use crate::dialog::UnsavedChangesDialog;
use crate::layout::DockLayout;

const TARGET: &str = "bladestack.dock";

/// What a dock bar restores or closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DockTarget {
    /// The whole minimized blade stack.
    Stack,
    Edit(String),
    View(String),
}

impl DockTarget {
    /// Registry family, `None` for the stack bar.
    #[must_use]
    pub fn blade_type(&self) -> Option<BladeType> {
        match self {
            Self::Stack => None,
            Self::Edit(_) => Some(BladeType::Edit),
            Self::View(_) => Some(BladeType::View),
        }
    }

    /// Registry id, `None` for the stack bar.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Stack => None,
            Self::Edit(id) | Self::View(id) => Some(id.as_str()),
        }
    }
}

/// One restore bar.
#[derive(Debug, Clone, PartialEq)]
pub struct DockItem {
    pub target: DockTarget,
    pub label: String,
    /// Stack bar only: more than one blade is hidden behind it.
    pub layered: bool,
    /// Edit bar only: unsaved changes marker.
    pub dirty: bool,
    pub stack_controlled: bool,
    pub minimized_at: Option<Instant>,
}

impl DockItem {
    /// The stack bar has no close button.
    #[must_use]
    pub fn closable(&self) -> bool {
        self.target != DockTarget::Stack
    }

    fn from_state(target: DockTarget, blade: &BladeState) -> Self {
        Self {
            target,
            label: blade.name.clone(),
            layered: false,
            dirty: blade.is_dirty,
            stack_controlled: blade.stack_controlled,
            minimized_at: blade.minimized_at,
        }
    }
}

/// Result of closing a dock bar.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// Removed from its registry.
    Closed(BladeState),
    /// Dirty edit blade: the unsaved-changes dialog is now open.
    ConfirmationRequired,
    /// The stack bar cannot be closed.
    NotClosable,
    /// No such blade, or its registry is not mounted.
    Unknown,
}

/// The minimized dock controller.
#[derive(Debug, Clone, Default)]
pub struct MinimizedDock {
    config: DockConfig,
    dialog: UnsavedChangesDialog,
}

impl MinimizedDock {
    pub fn new(config: DockConfig) -> Self {
        Self {
            config,
            dialog: UnsavedChangesDialog::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    #[must_use]
    pub fn dialog(&self) -> &UnsavedChangesDialog {
        &self.dialog
    }

    /// Bars to show, in display order (right to left).
    #[must_use]
    pub fn items(
        &self,
        stack: &BladeStack,
        edit: Option<&EditBlades>,
        view: Option<&ViewBlades>,
    ) -> Vec<DockItem> {
        let mut items = Vec::new();
        if stack.is_stack_minimized() {
            items.push(DockItem {
                target: DockTarget::Stack,
                label: stack.stack_label().to_owned(),
                layered: stack.stack_count() > 1,
                dirty: false,
                stack_controlled: false,
                minimized_at: None,
            });
        }

        let mut blades: Vec<DockItem> = Vec::new();
        if let Some(edit) = edit {
            blades.extend(
                edit.minimized()
                    .map(|b| DockItem::from_state(DockTarget::Edit(b.id.clone()), b)),
            );
        }
        if let Some(view) = view {
            blades.extend(view.minimized().map(|b| {
                let mut item = DockItem::from_state(DockTarget::View(b.id.clone()), b);
                item.dirty = false;
                item
            }));
        }
        // Stable: edit bars stay ahead of view bars minimized at the same time.
        blades.sort_by_key(|item| item.minimized_at);
        items.extend(blades);
        items
    }

    /// Place `items` along the bottom-right edge of `viewport`.
    #[must_use]
    pub fn layout(&self, items: &[DockItem], viewport: Viewport) -> DockLayout {
        DockLayout::new(items, &self.config, viewport)
    }

    /// Restore whatever `target` points at. Returns `false` if nothing changed.
    pub fn restore(
        &mut self,
        target: &DockTarget,
        stack: &mut BladeStack,
        edit: Option<&mut EditBlades>,
        view: Option<&mut ViewBlades>,
    ) -> bool {
        let restored = match target {
            DockTarget::Stack => {
                if !stack.is_stack_minimized() {
                    return false;
                }
                stack.maximize_stack();
                true
            }
            DockTarget::Edit(id) => edit.is_some_and(|reg| restore_in(reg, id, stack)),
            DockTarget::View(id) => view.is_some_and(|reg| restore_in(reg, id, stack)),
        };
        tracing::debug!(target: TARGET, dock_target = ?target, restored, "dock restore");
        restored
    }

    /// Close a registry bar. Dirty edit blades require confirmation first.
    pub fn close(
        &mut self,
        target: &DockTarget,
        edit: Option<&mut EditBlades>,
        view: Option<&mut ViewBlades>,
    ) -> CloseOutcome {
        let outcome = match target {
            DockTarget::Stack => CloseOutcome::NotClosable,
            DockTarget::View(id) => view
                .and_then(|reg| reg.close_blade(id))
                .map_or(CloseOutcome::Unknown, CloseOutcome::Closed),
            DockTarget::Edit(id) => match edit {
                None => CloseOutcome::Unknown,
                Some(reg) => match reg.get_blade(id).map(|b| b.is_dirty) {
                    None => CloseOutcome::Unknown,
                    Some(true) => {
                        self.dialog.request(id.clone());
                        CloseOutcome::ConfirmationRequired
                    }
                    Some(false) => reg
                        .close_blade(id)
                        .map_or(CloseOutcome::Unknown, CloseOutcome::Closed),
                },
            },
        };
        tracing::debug!(
            target: TARGET,
            dock_target = ?target,
            confirmation = matches!(outcome, CloseOutcome::ConfirmationRequired),
            "dock close"
        );
        outcome
    }

    /// Discard changes: close the pending edit blade and the dialog.
    pub fn confirm(&mut self, edit: Option<&mut EditBlades>) -> Option<BladeState> {
        let id = self.dialog.take()?;
        let closed = edit.and_then(|reg| reg.close_blade(&id));
        tracing::info!(
            target: TARGET,
            id = %id,
            closed = closed.is_some(),
            "unsaved changes discarded"
        );
        closed
    }

    /// Stay here: close the dialog and keep the blade.
    pub fn cancel(&mut self) -> bool {
        let pending = self.dialog.take();
        if let Some(id) = &pending {
            tracing::debug!(target: TARGET, id = %id, "close cancelled");
        }
        pending.is_some()
    }

    /// Escape dismisses an open dialog. Returns `true` if the event was used.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        self.dialog.is_open() && event.is_escape_press() && self.cancel()
    }
}

fn restore_in<K: RegistryKind>(
    registry: &mut BladeRegistry<K>,
    id: &str,
    stack: &mut BladeStack,
) -> bool {
    let Some(stack_controlled) = registry.get_blade(id).map(|b| b.stack_controlled) else {
        return false;
    };
    registry.maximize_blade(id);
    if stack_controlled && stack.stack_count() > 1 {
        stack.maximize_stack();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use blade_core::{Duration, KeyCode};
    use blade_registry::OpenOptions;
    use blade_stack::{BladePanel, BladeProps, ReadySignal};

    struct Ready;

    impl BladePanel for Ready {
        fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
            ready.notify();
        }
    }

    fn stack_with(count: usize, label: &str) -> BladeStack {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        for _ in 0..count {
            stack.open_resolved(
                Ok(Box::new(Ready)),
                BladeProps::new(),
                Some(label.to_owned()),
                now,
                &mut [],
            );
        }
        stack
    }

    // --- Items ---

    #[test]
    fn no_items_when_nothing_minimized() {
        let dock = MinimizedDock::default();
        let stack = stack_with(2, "Reports");
        assert!(dock.items(&stack, None, None).is_empty());
    }

    #[test]
    fn stack_bar_comes_first_and_is_layered() {
        let dock = MinimizedDock::default();
        let t0 = Instant::now();
        let mut stack = stack_with(2, "Reports");
        let mut edit = EditBlades::default();
        edit.open_blade("e1", Some("Draft"), OpenOptions::new());
        edit.minimize_blade("e1", t0);
        stack.minimize_stack();

        let items = dock.items(&stack, Some(&edit), None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].target, DockTarget::Stack);
        assert_eq!(items[0].label, "Reports");
        assert!(items[0].layered);
        assert!(!items[0].closable());
        assert_eq!(items[1].target, DockTarget::Edit("e1".into()));
    }

    #[test]
    fn single_blade_stack_is_not_layered() {
        let dock = MinimizedDock::default();
        let mut stack = stack_with(1, "One");
        stack.minimize_stack();
        assert!(!dock.items(&stack, None, None)[0].layered);
    }

    #[test]
    fn registry_bars_sorted_by_minimize_time() {
        let dock = MinimizedDock::default();
        let t0 = Instant::now();
        let stack = BladeStack::default();
        let mut edit = EditBlades::default();
        let mut view = ViewBlades::default();
        edit.open_blade("e1", None, OpenOptions::new());
        edit.open_blade("e2", None, OpenOptions::new());
        view.open_blade("v1", None, OpenOptions::new());
        edit.minimize_blade("e2", t0 + Duration::from_secs(3));
        view.minimize_blade("v1", t0 + Duration::from_secs(1));
        edit.minimize_blade("e1", t0 + Duration::from_secs(1));

        let targets: Vec<DockTarget> = dock
            .items(&stack, Some(&edit), Some(&view))
            .into_iter()
            .map(|i| i.target)
            .collect();
        assert_eq!(
            targets,
            vec![
                DockTarget::Edit("e1".into()),
                DockTarget::View("v1".into()),
                DockTarget::Edit("e2".into()),
            ]
        );
    }

    #[test]
    fn missing_registries_contribute_nothing() {
        let dock = MinimizedDock::default();
        let stack = BladeStack::default();
        assert!(dock.items(&stack, None, None).is_empty());
    }

    // --- Restore ---

    #[test]
    fn restore_stack_bar() {
        let mut dock = MinimizedDock::default();
        let mut stack = stack_with(1, "One");
        stack.minimize_stack();
        assert!(dock.restore(&DockTarget::Stack, &mut stack, None, None));
        assert!(!stack.is_stack_minimized());
        assert!(!dock.restore(&DockTarget::Stack, &mut stack, None, None));
    }

    #[test]
    fn restore_stack_controlled_blade_also_restores_layered_stack() {
        let mut dock = MinimizedDock::default();
        let now = Instant::now();
        let mut stack = stack_with(2, "Reports");
        let mut view = ViewBlades::default();
        view.open_blade("v1", None, OpenOptions::new().stack_controlled(true));
        view.minimize_blade("v1", now);
        stack.minimize_stack();

        let target = DockTarget::View("v1".into());
        assert!(dock.restore(&target, &mut stack, None, Some(&mut view)));
        assert!(!view.get_blade("v1").unwrap().is_minimized);
        assert!(!stack.is_stack_minimized());
    }

    #[test]
    fn restore_stack_controlled_blade_with_single_blade_stack_keeps_stack_hidden() {
        let mut dock = MinimizedDock::default();
        let now = Instant::now();
        let mut stack = stack_with(1, "Reports");
        let mut edit = EditBlades::default();
        edit.open_blade("e1", None, OpenOptions::new().stack_controlled(true));
        edit.minimize_blade("e1", now);
        stack.minimize_stack();

        assert!(dock.restore(&DockTarget::Edit("e1".into()), &mut stack, Some(&mut edit), None));
        assert!(stack.is_stack_minimized());
    }

    #[test]
    fn restore_unknown_is_false() {
        let mut dock = MinimizedDock::default();
        let mut stack = BladeStack::default();
        let mut edit = EditBlades::default();
        assert!(!dock.restore(&DockTarget::Edit("x".into()), &mut stack, Some(&mut edit), None));
        assert!(!dock.restore(&DockTarget::View("x".into()), &mut stack, None, None));
    }

    // --- Close / confirm ---

    #[test]
    fn clean_edit_and_view_close_immediately() {
        let mut dock = MinimizedDock::default();
        let mut edit = EditBlades::default();
        let mut view = ViewBlades::default();
        edit.open_blade("e1", None, OpenOptions::new());
        view.open_blade("v1", None, OpenOptions::new());

        let out = dock.close(&DockTarget::Edit("e1".into()), Some(&mut edit), None);
        assert!(matches!(out, CloseOutcome::Closed(ref b) if b.id == "e1"));
        let out = dock.close(&DockTarget::View("v1".into()), None, Some(&mut view));
        assert!(matches!(out, CloseOutcome::Closed(_)));
        assert!(edit.is_empty() && view.is_empty());
        assert!(!dock.dialog().is_open());
    }

    #[test]
    fn dirty_edit_requires_confirmation() {
        let mut dock = MinimizedDock::default();
        let mut edit = EditBlades::default();
        edit.open_blade("e1", None, OpenOptions::new());
        edit.set_dirty("e1", true);

        let out = dock.close(&DockTarget::Edit("e1".into()), Some(&mut edit), None);
        assert_eq!(out, CloseOutcome::ConfirmationRequired);
        assert!(dock.dialog().is_open());
        assert_eq!(dock.dialog().pending_id(), Some("e1"));
        assert_eq!(edit.len(), 1);

        let closed = dock.confirm(Some(&mut edit)).unwrap();
        assert_eq!(closed.id, "e1");
        assert!(edit.is_empty());
        assert!(!dock.dialog().is_open());
    }

    #[test]
    fn cancel_leaves_blade_unchanged() {
        let mut dock = MinimizedDock::default();
        let now = Instant::now();
        let mut edit = EditBlades::default();
        edit.open_blade("e1", None, OpenOptions::new());
        edit.set_dirty("e1", true);
        edit.minimize_blade("e1", now);
        let before = edit.get_blade("e1").cloned();

        dock.close(&DockTarget::Edit("e1".into()), Some(&mut edit), None);
        assert!(dock.cancel());
        assert!(!dock.dialog().is_open());
        assert_eq!(edit.get_blade("e1").cloned(), before);
        assert!(!dock.cancel());
    }

    #[test]
    fn escape_cancels_open_dialog_only() {
        let mut dock = MinimizedDock::default();
        let escape = Event::key(KeyCode::Escape);
        assert!(!dock.handle_event(&escape));

        let mut edit = EditBlades::default();
        edit.open_blade("e1", None, OpenOptions::new());
        edit.set_dirty("e1", true);
        dock.close(&DockTarget::Edit("e1".into()), Some(&mut edit), None);
        assert!(dock.handle_event(&escape));
        assert!(!dock.dialog().is_open());
        assert_eq!(edit.len(), 1);
    }

    #[test]
    fn stack_bar_is_not_closable() {
        let mut dock = MinimizedDock::default();
        assert_eq!(dock.close(&DockTarget::Stack, None, None), CloseOutcome::NotClosable);
        assert_eq!(
            dock.close(&DockTarget::View("nope".into()), None, None),
            CloseOutcome::Unknown
        );
    }
}
