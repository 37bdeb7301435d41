#![forbid(unsafe_code)]

//! Deterministic scenario replay.
//!
//! The runner drives a [`Workspace`] directly with a manual clock that only
//! moves on `advance` steps. Deferred loads hold their [`OpenTicket`] under a
//! handle until a `resolve`/`reject` step settles them, which is exactly the
//! interleaving an async host produces.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bladestack::{
    BladeConfig, BladePanel, BladeProps, BladeType, CloseOutcome, Duration, Event, Instant,
    KeyCode, LoadError, LoadResult, OpenOptions, OpenTicket, ReadySignal, StackEvent, Viewport,
    Workspace, WorkspaceAction,
};

use crate::error::{HarnessError, Result};
use crate::scenario::{
    Expectation, LoaderMode, RegistryAction, Scenario, SignalMode, Step, parse_target,
};
use crate::snapshot::{Snapshot, Trace};

const TARGET: &str = "bladestack.harness";

type HeldSignal = Rc<RefCell<Option<ReadySignal>>>;

/// Panel whose readiness the scenario controls.
struct ScenarioPanel {
    blade_type: BladeType,
    held: Option<HeldSignal>,
}

impl BladePanel for ScenarioPanel {
    fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
        match &self.held {
            Some(slot) => *slot.borrow_mut() = Some(ready),
            None => ready.notify(),
        }
    }

    fn blade_type(&self) -> BladeType {
        self.blade_type
    }

    fn name(&self) -> &str {
        "scenario"
    }
}

/// A deferred load waiting for its `resolve`/`reject` step.
struct PendingLoad {
    ticket: OpenTicket,
    panel: ScenarioPanel,
}

/// Replays one scenario.
pub struct Runner {
    workspace: Workspace,
    origin: Instant,
    elapsed: Duration,
    pending: HashMap<String, PendingLoad>,
    signals: HashMap<String, HeldSignal>,
    last_outcome: Option<&'static str>,
    trace: Trace,
}

impl Runner {
    pub fn new(scenario_name: &str, config: BladeConfig, viewport: Option<Viewport>) -> Result<Self> {
        let mut workspace = Workspace::try_new(config)?;
        if let Some(viewport) = viewport {
            workspace.set_viewport(viewport);
        }
        Ok(Self {
            workspace,
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            pending: HashMap::new(),
            signals: HashMap::new(),
            last_outcome: None,
            trace: Trace {
                scenario: scenario_name.to_string(),
                snapshots: Vec::new(),
            },
        })
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Apply one step and record its snapshot. `expect` steps check the
    /// previous snapshot and record nothing.
    pub fn apply(&mut self, index: usize, step: &Step) -> Result<()> {
        let _span = tracing::debug_span!(target: TARGET, "harness.step", step = index, op = step.op())
            .entered();

        if let Step::Expect(expectation) = step {
            return self.check(index, expectation);
        }

        let mut outcome: Option<&'static str> = None;
        let mut action: Option<String> = None;
        let mut events: Vec<StackEvent> = Vec::new();
        let now = self.now();

        match step {
            Step::Open {
                label,
                loader,
                signal,
                blade_type,
                handle,
                message,
            } => {
                let held = match (signal, handle) {
                    (SignalMode::Immediate, _) => None,
                    (SignalMode::Manual, Some(handle)) => {
                        let slot: HeldSignal = Rc::new(RefCell::new(None));
                        self.signals.insert(handle.clone(), Rc::clone(&slot));
                        Some(slot)
                    }
                    (SignalMode::Manual, None) => {
                        return Err(HarnessError::invalid_step(index, "manual signal needs a handle"));
                    }
                };
                let panel = ScenarioPanel {
                    blade_type: *blade_type,
                    held,
                };
                let props = BladeProps::new().with("step", index as u64);
                match loader {
                    LoaderMode::Ready => {
                        let result: LoadResult = Ok(Box::new(panel));
                        let settled = self.workspace.open_resolved(result, props, label.clone(), now);
                        outcome = Some(settled.kind());
                    }
                    LoaderMode::Fail => {
                        let error = LoadError::new(message.as_deref().unwrap_or("loader failed"));
                        let settled = self
                            .workspace
                            .open_resolved(Err(error), props, label.clone(), now);
                        outcome = Some(settled.kind());
                    }
                    LoaderMode::Deferred => {
                        let Some(handle) = handle else {
                            return Err(HarnessError::invalid_step(index, "deferred open needs a handle"));
                        };
                        match self.workspace.begin_open(props, label.clone(), now) {
                            Ok(ticket) => {
                                self.pending.insert(handle.clone(), PendingLoad { ticket, panel });
                            }
                            Err(refused) => outcome = Some(refused.kind()),
                        }
                    }
                }
            }
            Step::Resolve { handle } => {
                let load = self.take_pending(index, handle)?;
                let settled = self
                    .workspace
                    .complete_open(load.ticket, Ok(Box::new(load.panel)), now);
                outcome = Some(settled.kind());
            }
            Step::Reject { handle, message } => {
                let load = self.take_pending(index, handle)?;
                let error = LoadError::new(message.as_deref().unwrap_or("loader failed"));
                let settled = self.workspace.complete_open(load.ticket, Err(error), now);
                outcome = Some(settled.kind());
            }
            Step::Ready { handle } => {
                let fired = self
                    .signals
                    .remove(handle)
                    .and_then(|slot| slot.take())
                    .ok_or_else(|| {
                        HarnessError::invalid_step(index, format!("no held ready signal {handle:?}"))
                    })?;
                fired.notify();
                self.workspace.drain_ready();
            }
            Step::Escape => action = self.send(&Event::key(KeyCode::Escape)),
            Step::Click { x, y } => action = self.send(&Event::click(*x, *y)),
            Step::Resize { width, height } => {
                action = self.send(&Event::Resize {
                    width: *width,
                    height: *height,
                });
            }
            Step::Advance { ms } => {
                self.elapsed += Duration::from_millis(*ms);
                events = self.workspace.tick(self.now());
            }
            Step::Tick => events = self.workspace.tick(now),
            Step::CloseTop => {
                action = self.workspace.close_top_blade().map(|id| format!("closed {id}"));
            }
            Step::MinimizeStack => self.workspace.minimize_stack(),
            Step::MaximizeStack => self.workspace.maximize_stack(),
            Step::Unmount => {
                let cancelled = self.workspace.cancel_pending();
                action = Some(format!("cancelled {cancelled}"));
            }
            Step::Registry {
                kind,
                action: registry_action,
                id,
                name,
                stack_controlled,
                disable_minimize,
                z_index,
            } => {
                let options = OpenOptions {
                    disable_minimize: *disable_minimize,
                    stack_controlled: *stack_controlled,
                    z_index: *z_index,
                };
                let changed = self.registry_op(*kind, *registry_action, id, name.as_deref(), options, now)?;
                action = Some(changed);
            }
            Step::MinimizeEntity { kind, id } => {
                let minimized = self.workspace.minimize_entity(*kind, id, now)?;
                action = Some(format!("minimized {minimized}"));
            }
            Step::ForceCloseEdit { id } => {
                let closed = self.workspace.force_close_edit(id)?;
                action = Some(match closed {
                    Some(id) => format!("closed {id}"),
                    None => "closed none".to_string(),
                });
            }
            Step::DockRestore { target } => {
                let target = self.target(index, target)?;
                action = Some(format!("restored {}", self.workspace.dock_restore(&target)));
            }
            Step::DockClose { target } => {
                let target = self.target(index, target)?;
                action = Some(close_name(&self.workspace.dock_close(&target)));
            }
            Step::Confirm => {
                let closed = self.workspace.confirm_close();
                action = Some(format!("confirmed {}", closed.is_some()));
            }
            Step::Cancel => action = Some(format!("cancelled {}", self.workspace.cancel_close())),
            Step::Expect(_) => {}
        }

        if outcome.is_some() {
            self.last_outcome = outcome;
        }
        let mut snapshot = Snapshot::capture(&self.workspace, index, step.op(), self.elapsed_ms());
        snapshot.outcome = outcome.map(str::to_string);
        snapshot.action = action;
        snapshot.events = events.iter().map(event_name).collect();
        tracing::debug!(
            target: TARGET,
            step = index,
            stack_count = snapshot.stack_count,
            outcome = snapshot.outcome.as_deref().unwrap_or(""),
            "step applied"
        );
        self.trace.snapshots.push(snapshot);
        Ok(())
    }

    /// Replay `scenario` from a fresh workspace.
    pub fn run(scenario: &Scenario) -> Result<Trace> {
        let viewport = scenario.viewport.map(|v| Viewport::new(v.width, v.height));
        let mut runner = Self::new(&scenario.name, scenario.config.clone(), viewport)?;
        for (index, step) in scenario.steps.iter().enumerate() {
            runner.apply(index, step)?;
        }
        tracing::info!(
            target: TARGET,
            scenario = %scenario.name,
            steps = scenario.steps.len(),
            "scenario finished"
        );
        Ok(runner.into_trace())
    }

    #[must_use]
    pub fn into_trace(self) -> Trace {
        self.trace
    }

    fn send(&mut self, event: &Event) -> Option<String> {
        self.workspace.handle_event(event).map(|a| action_name(&a))
    }

    fn take_pending(&mut self, index: usize, handle: &str) -> Result<PendingLoad> {
        self.pending
            .remove(handle)
            .ok_or_else(|| HarnessError::invalid_step(index, format!("no pending load {handle:?}")))
    }

    fn target(&self, index: usize, raw: &str) -> Result<bladestack::DockTarget> {
        parse_target(raw)
            .ok_or_else(|| HarnessError::invalid_step(index, format!("bad dock target {raw:?}")))
    }

    fn registry_op(
        &mut self,
        kind: BladeType,
        action: RegistryAction,
        id: &str,
        name: Option<&str>,
        options: OpenOptions,
        now: Instant,
    ) -> Result<String> {
        macro_rules! apply {
            ($registry:expr) => {{
                let registry = $registry;
                match action {
                    RegistryAction::Open => {
                        format!("z {}", registry.open_blade(id, name, options).z_index())
                    }
                    RegistryAction::Minimize => format!("minimized {}", registry.minimize_blade(id, now)),
                    RegistryAction::Maximize => format!("maximized {}", registry.maximize_blade(id)),
                    RegistryAction::Close => format!("closed {}", registry.close_blade(id).is_some()),
                    RegistryAction::Dirty => format!("dirty {}", registry.set_dirty(id, true)),
                    RegistryAction::Clean => format!("clean {}", registry.set_dirty(id, false)),
                }
            }};
        }
        Ok(match kind {
            BladeType::Edit => apply!(self.workspace.edit_blades_mut()?),
            BladeType::View => apply!(self.workspace.view_blades_mut()?),
        })
    }

    fn check(&self, index: usize, expect: &Expectation) -> Result<()> {
        let Some(snap) = self.trace.last() else {
            return Err(HarnessError::invalid_step(index, "expect before any step"));
        };
        let mut checks = Checks { index, failure: None };
        checks.field("stack_count", expect.stack_count, snap.stack_count);
        checks.field("pending", expect.pending, snap.pending);
        checks.field("ready_count", expect.ready_count, snap.ready_count);
        checks.field("minimized", expect.minimized, snap.minimized);
        checks.field("loading", expect.loading, snap.loading);
        checks.field("progress_visible", expect.progress_visible, snap.progress_visible);
        checks.field("label", expect.label.clone(), snap.label.clone());
        checks.field("active_z_index", expect.active_z_index, snap.active_z_index);
        checks.field(
            "offsets",
            expect.offsets.clone(),
            snap.visible.iter().map(|b| b.offset_x).collect(),
        );
        checks.field("dock", expect.dock.clone(), snap.dock.clone());
        checks.field("dialog_open", expect.dialog_open, snap.dialog_open);
        checks.field(
            "outcome",
            expect.outcome.clone(),
            self.last_outcome.unwrap_or("none").to_string(),
        );
        checks.field(
            "edit_minimized",
            expect.edit_minimized.clone(),
            Snapshot::minimized_ids(&snap.edit),
        );
        checks.field(
            "view_minimized",
            expect.view_minimized.clone(),
            Snapshot::minimized_ids(&snap.view),
        );
        checks.finish()
    }
}

/// First failing expectation wins.
struct Checks {
    index: usize,
    failure: Option<HarnessError>,
}

impl Checks {
    fn field<T: PartialEq + std::fmt::Debug>(&mut self, name: &'static str, expected: Option<T>, actual: T) {
        if self.failure.is_some() {
            return;
        }
        if let Some(expected) = expected.filter(|e| *e != actual) {
            self.failure = Some(HarnessError::ExpectationFailed {
                step: self.index,
                field: name,
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
            });
        }
    }

    fn finish(self) -> Result<()> {
        self.failure.map_or(Ok(()), Err)
    }
}

fn event_name(event: &StackEvent) -> String {
    match event {
        StackEvent::ProgressShown => "progress_shown".to_string(),
        StackEvent::ProgressHidden => "progress_hidden".to_string(),
        StackEvent::ReadyTimedOut(id) => format!("ready_timed_out {id}"),
    }
}

fn action_name(action: &WorkspaceAction) -> String {
    match action {
        WorkspaceAction::Stack(bladestack::StackAction::Closed(id)) => format!("closed {id}"),
        WorkspaceAction::Stack(bladestack::StackAction::Absorbed) => "absorbed".to_string(),
        WorkspaceAction::DockRestored(target) => {
            format!("restored {}", crate::scenario::format_target(target))
        }
        WorkspaceAction::DockClosed(outcome) => close_name(outcome),
        WorkspaceAction::DialogCancelled => "dialog_cancelled".to_string(),
        WorkspaceAction::Blocked => "blocked".to_string(),
    }
}

fn close_name(outcome: &CloseOutcome) -> String {
    match outcome {
        CloseOutcome::Closed(state) => format!("closed {}", state.id),
        CloseOutcome::ConfirmationRequired => "confirmation_required".to_string(),
        CloseOutcome::NotClosable => "not_closable".to_string(),
        CloseOutcome::Unknown => "unknown".to_string(),
    }
}
