#![forbid(unsafe_code)]

//! The workspace: stack, registries, and dock wired together.
//!
//! # Role
//!
//! A [`Workspace`] owns one [`BladeStack`], the optional edit and view
//! registries, and the [`MinimizedDock`]. It routes input to the right owner
//! and applies the cross-cutting rules none of them can apply alone:
//!
//! - opening a blade while the stack is minimized minimizes stack-controlled
//!   registry blades first;
//! - a stack-controlled blade's minimize button hides the whole stack;
//! - discarding an edit panel closes its registry entry together with the top
//!   stack blade.
//!
//! # Input routing
//!
//! 1. While the unsaved-changes dialog is open it is modal: Escape cancels it
//!    and every other key or click is swallowed.
//! 2. Escape goes to the stack.
//! 3. Clicks go to the stack when they land on one of its layers, otherwise
//!    to the dock.

use blade_core::{BladeConfig, BladeId, BladeType, Event, StackFollower, Viewport};
use blade_dock::{CloseOutcome, DockHit, DockItem, DockLayout, DockTarget, MinimizedDock};
use blade_registry::{BladeState, EditBlades, ViewBlades};
use blade_stack::{
    BladeProps, BladeStack, LoadResult, OpenOutcome, OpenTicket, StackAction, StackEvent,
    StackLayout, StandaloneLayer,
};
use web_time::Instant;

use crate::error::{Error, Result};

const TARGET: &str = "bladestack.workspace";

/// What `handle_event` did.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceAction {
    Stack(StackAction),
    DockRestored(DockTarget),
    DockClosed(CloseOutcome),
    DialogCancelled,
    /// Swallowed by the modal dialog.
    Blocked,
}

/// Stack, registries, and dock in one place.
#[derive(Debug)]
pub struct Workspace {
    config: BladeConfig,
    stack: BladeStack,
    edit: Option<EditBlades>,
    view: Option<ViewBlades>,
    dock: MinimizedDock,
    viewport: Viewport,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(BladeConfig::default())
    }
}

impl Workspace {
    /// A workspace with both registries mounted.
    pub fn new(config: BladeConfig) -> Self {
        Self {
            stack: BladeStack::new(config.stack.clone()).with_layout(config.layout.clone()),
            edit: Some(EditBlades::new(config.registry)),
            view: Some(ViewBlades::new(config.registry)),
            dock: MinimizedDock::new(config.dock),
            viewport: Viewport::default(),
            config,
        }
    }

    /// Validate `config` first.
    pub fn try_new(config: BladeConfig) -> Result<Self> {
        Ok(Self::new(config.into_validated()?))
    }

    /// Load configuration from a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(BladeConfig::from_toml_file(path)?))
    }

    /// Run without an edit registry.
    #[must_use]
    pub fn without_edit_registry(mut self) -> Self {
        self.edit = None;
        self
    }

    /// Run without a view registry.
    #[must_use]
    pub fn without_view_registry(mut self) -> Self {
        self.view = None;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BladeConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // --- Owned parts ---

    #[must_use]
    pub fn stack(&self) -> &BladeStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut BladeStack {
        &mut self.stack
    }

    #[must_use]
    pub fn dock(&self) -> &MinimizedDock {
        &self.dock
    }

    #[must_use]
    pub fn maybe_edit_blades(&self) -> Option<&EditBlades> {
        self.edit.as_ref()
    }

    pub fn maybe_edit_blades_mut(&mut self) -> Option<&mut EditBlades> {
        self.edit.as_mut()
    }

    #[must_use]
    pub fn maybe_view_blades(&self) -> Option<&ViewBlades> {
        self.view.as_ref()
    }

    pub fn maybe_view_blades_mut(&mut self) -> Option<&mut ViewBlades> {
        self.view.as_mut()
    }

    pub fn edit_blades(&self) -> Result<&EditBlades> {
        self.edit.as_ref().ok_or(Error::RegistryMissing(BladeType::Edit))
    }

    pub fn edit_blades_mut(&mut self) -> Result<&mut EditBlades> {
        self.edit.as_mut().ok_or(Error::RegistryMissing(BladeType::Edit))
    }

    pub fn view_blades(&self) -> Result<&ViewBlades> {
        self.view.as_ref().ok_or(Error::RegistryMissing(BladeType::View))
    }

    pub fn view_blades_mut(&mut self) -> Result<&mut ViewBlades> {
        self.view.as_mut().ok_or(Error::RegistryMissing(BladeType::View))
    }

    // --- Stack ---

    pub fn begin_open(
        &mut self,
        props: BladeProps,
        label: Option<String>,
        now: Instant,
    ) -> std::result::Result<OpenTicket, OpenOutcome> {
        match self.stack.begin_open(props, label, now) {
            Err(OpenOutcome::CapacityExceeded) => {
                // A refused open still brings a minimized stack back.
                let mut followers = followers(&mut self.edit, &mut self.view);
                self.stack.restore_for_open(now, &mut followers);
                Err(OpenOutcome::CapacityExceeded)
            }
            other => other,
        }
    }

    /// Finish an open, letting mounted registries follow the stack.
    pub fn complete_open(&mut self, ticket: OpenTicket, result: LoadResult, now: Instant) -> OpenOutcome {
        let mut followers = followers(&mut self.edit, &mut self.view);
        self.stack.complete_open(ticket, result, now, &mut followers)
    }

    /// Open an already-resolved panel.
    pub fn open_resolved(
        &mut self,
        result: LoadResult,
        props: BladeProps,
        label: Option<String>,
        now: Instant,
    ) -> OpenOutcome {
        match self.begin_open(props, label, now) {
            Ok(ticket) => self.complete_open(ticket, result, now),
            Err(outcome) => outcome,
        }
    }

    pub fn close_top_blade(&mut self) -> Option<BladeId> {
        self.stack.close_top_blade()
    }

    pub fn minimize_stack(&mut self) {
        self.stack.minimize_stack();
    }

    pub fn maximize_stack(&mut self) {
        self.stack.maximize_stack();
    }

    pub fn mark_ready(&mut self, id: BladeId) -> bool {
        self.stack.mark_ready(id)
    }

    /// Apply ready signals sent since the last drain.
    pub fn drain_ready(&mut self) -> Vec<BladeId> {
        self.stack.drain_ready()
    }

    /// Invalidate in-flight opens (host unmount).
    pub fn cancel_pending(&mut self) -> usize {
        self.stack.cancel_pending()
    }

    pub fn tick(&mut self, now: Instant) -> Vec<StackEvent> {
        self.stack.tick(now)
    }

    /// z-indices for a blade drawn outside the stack.
    #[must_use]
    pub fn standalone_layer(&self, explicit: Option<i32>) -> StandaloneLayer {
        self.stack.standalone_layer(explicit)
    }

    // --- Panel buttons ---

    /// A panel's minimize button.
    ///
    /// Blades with `disable_minimize` have no such button, so nothing happens.
    /// Stack-controlled blades hide the whole stack; others minimize in their
    /// registry. Returns whether anything was minimized.
    pub fn minimize_entity(&mut self, kind: BladeType, id: &str, now: Instant) -> Result<bool> {
        let blade = self.registry_blade(kind, id)?;
        if blade.disable_minimize {
            tracing::debug!(target: TARGET, %kind, id, "minimize button disabled for this blade");
            return Ok(false);
        }
        if blade.stack_controlled {
            self.stack.minimize_stack();
            tracing::debug!(target: TARGET, %kind, id, "stack minimized from panel");
            return Ok(true);
        }
        let minimized = match kind {
            BladeType::Edit => self.edit_blades_mut()?.minimize_blade(id, now),
            BladeType::View => self.view_blades_mut()?.minimize_blade(id, now),
        };
        Ok(minimized)
    }

    /// An edit panel's "discard changes": drop the registry entry and close
    /// the top stack blade that hosts it.
    pub fn force_close_edit(&mut self, id: &str) -> Result<Option<BladeId>> {
        let edit = self.edit_blades_mut()?;
        if edit.close_blade(id).is_none() {
            return Err(Error::UnknownBlade {
                kind: BladeType::Edit,
                id: id.to_owned(),
            });
        }
        let closed = self.stack.close_top_blade();
        tracing::info!(target: TARGET, id, stack_closed = closed.is_some(), "edit blade discarded");
        Ok(closed)
    }

    fn registry_blade(&self, kind: BladeType, id: &str) -> Result<&BladeState> {
        let found = match kind {
            BladeType::Edit => self.edit_blades()?.get_blade(id),
            BladeType::View => self.view_blades()?.get_blade(id),
        };
        found.ok_or_else(|| Error::UnknownBlade {
            kind,
            id: id.to_owned(),
        })
    }

    // --- Dock ---

    #[must_use]
    pub fn dock_items(&self) -> Vec<DockItem> {
        self.dock
            .items(&self.stack, self.edit.as_ref(), self.view.as_ref())
    }

    #[must_use]
    pub fn dock_layout(&self) -> DockLayout {
        self.dock.layout(&self.dock_items(), self.viewport)
    }

    pub fn dock_restore(&mut self, target: &DockTarget) -> bool {
        self.dock
            .restore(target, &mut self.stack, self.edit.as_mut(), self.view.as_mut())
    }

    pub fn dock_close(&mut self, target: &DockTarget) -> CloseOutcome {
        self.dock.close(target, self.edit.as_mut(), self.view.as_mut())
    }

    /// Confirm the pending unsaved-changes close.
    pub fn confirm_close(&mut self) -> Option<BladeState> {
        self.dock.confirm(self.edit.as_mut())
    }

    /// Keep the blade; close the dialog.
    pub fn cancel_close(&mut self) -> bool {
        self.dock.cancel()
    }

    // --- Layout and input ---

    #[must_use]
    pub fn layout(&self) -> StackLayout {
        self.stack.layout(self.viewport)
    }

    /// Route one input event.
    pub fn handle_event(&mut self, event: &Event) -> Option<WorkspaceAction> {
        if let Event::Resize { width, height } = *event {
            self.viewport = Viewport::new(width, height);
            return None;
        }

        if self.dock.dialog().is_open() {
            if self.dock.handle_event(event) {
                return Some(WorkspaceAction::DialogCancelled);
            }
            let modal_input = matches!(event, Event::Key(_)) || event.primary_click().is_some();
            return modal_input.then_some(WorkspaceAction::Blocked);
        }

        let layout = self.layout();
        if event.is_escape_press() {
            return self.stack.handle_event(event, &layout).map(WorkspaceAction::Stack);
        }

        let (x, y) = event.primary_click()?;
        if layout.hit_test(x, y).is_some() {
            return self.stack.handle_event(event, &layout).map(WorkspaceAction::Stack);
        }

        match self.dock_layout().hit_test(x, y)? {
            DockHit::Restore(target) => self
                .dock_restore(&target)
                .then_some(WorkspaceAction::DockRestored(target)),
            DockHit::Close(target) => Some(WorkspaceAction::DockClosed(self.dock_close(&target))),
            DockHit::Bar(_) => None,
        }
    }
}

fn followers<'a>(
    edit: &'a mut Option<EditBlades>,
    view: &'a mut Option<ViewBlades>,
) -> Vec<&'a mut dyn StackFollower> {
    let mut followers: Vec<&mut dyn StackFollower> = Vec::with_capacity(2);
    if let Some(edit) = edit.as_mut() {
        followers.push(edit);
    }
    if let Some(view) = view.as_mut() {
        followers.push(view);
    }
    followers
}
