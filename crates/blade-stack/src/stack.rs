#![forbid(unsafe_code)]

//! The blade stack state machine.
//!
//! # Opening
//!
//! Opening is split in two so a host can await the loader without holding a
//! borrow of the stack:
//!
//! 1. [`BladeStack::begin_open`] checks capacity and reserves a slot. Entries
//!    plus outstanding reservations never exceed `max_depth`, so two opens
//!    racing at depth `max_depth - 1` cannot both succeed.
//! 2. [`BladeStack::complete_open`] consumes the ticket with the loader's
//!    result and either mounts the panel or releases the slot.
//!
//! Dropping an [`OpenTicket`] releases its slot. [`BladeStack::cancel_pending`]
//! invalidates every outstanding ticket at once.
//!
//! # Loading state
//!
//! The stack is *loading* while any reservation is outstanding or any entry is
//! mounted but not yet ready. `tick` turns on the progress bar once loading
//! has lasted `progress_delay`, and turns it off once loading settles.
//!
//! # Failure Modes
//!
//! - Loader rejection: logged at `error`, no entry added, `Rejected` returned.
//! - A panel that never signals ready: removed by `tick` after `ready_timeout`.
//! - Ready signals for closed blades are ignored.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use blade_core::{
    BladeId, BladeIdAllocator, BladeType, Event, LayoutConfig, StackConfig, StackFollower, Viewport,
};
use web_time::Instant;

use crate::layout::{EntrySummary, PlanState, StackHit, StackLayout, StandaloneLayer};
use crate::loader::{LoadError, LoadResult};
use crate::panel::{BladePanel, BladeProps, ReadySignal};

const TARGET: &str = "bladestack.stack";

// ---------------------------------------------------------------------------
// Entries and tickets
// ---------------------------------------------------------------------------

/// A mounted stack entry.
pub struct BladeEntry {
    id: BladeId,
    panel: Box<dyn BladePanel>,
    props: BladeProps,
    ready: bool,
    label: Option<String>,
    blade_type: BladeType,
    mounted_at: Instant,
}

impl BladeEntry {
    #[must_use]
    pub fn id(&self) -> BladeId {
        self.id
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn props(&self) -> &BladeProps {
        &self.props
    }

    #[must_use]
    pub fn blade_type(&self) -> BladeType {
        self.blade_type
    }

    #[must_use]
    pub fn mounted_at(&self) -> Instant {
        self.mounted_at
    }

    #[must_use]
    pub fn panel(&self) -> &dyn BladePanel {
        self.panel.as_ref()
    }

    fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            blade_type: self.blade_type,
            ready: self.ready,
        }
    }
}

impl fmt::Debug for BladeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BladeEntry")
            .field("id", &self.id)
            .field("panel", &self.panel.name())
            .field("ready", &self.ready)
            .field("label", &self.label)
            .field("blade_type", &self.blade_type)
            .finish_non_exhaustive()
    }
}

/// A held slot in the stack. Released on drop.
struct Reservation {
    pool: Rc<Cell<usize>>,
}

impl Reservation {
    fn acquire(pool: &Rc<Cell<usize>>) -> Self {
        pool.set(pool.get() + 1);
        Self {
            pool: Rc::clone(pool),
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.pool.set(self.pool.get().saturating_sub(1));
    }
}

/// Proof of a reserved slot, returned by [`BladeStack::begin_open`].
pub struct OpenTicket {
    reservation: Reservation,
    generation: u64,
    props: BladeProps,
    label: Option<String>,
    issued_at: Instant,
}

impl OpenTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }
}

impl fmt::Debug for OpenTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenTicket")
            .field("generation", &self.generation)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Outcomes, actions, events
// ---------------------------------------------------------------------------

/// Result of an open attempt.
#[derive(Debug)]
pub enum OpenOutcome {
    /// The panel is mounted (hidden until ready).
    Opened(BladeId),
    /// The loader rejected; nothing was added.
    Rejected(LoadError),
    /// The stack is full; nothing changed.
    CapacityExceeded,
    /// The ticket was invalidated before the loader settled.
    Cancelled,
}

impl OpenOutcome {
    #[must_use]
    pub fn opened_id(&self) -> Option<BladeId> {
        match self {
            Self::Opened(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened(_))
    }

    /// Stable lowercase name, for traces.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened(_) => "opened",
            Self::Rejected(_) => "rejected",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Cancelled => "cancelled",
        }
    }
}

/// What `handle_event` did with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAction {
    /// The top blade was closed.
    Closed(BladeId),
    /// The event was swallowed without a state change (loading veil).
    Absorbed,
}

/// Timer-driven changes reported by `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    ProgressShown,
    ProgressHidden,
    /// A blade never reported ready and was removed.
    ReadyTimedOut(BladeId),
}

// ---------------------------------------------------------------------------
// BladeStack
// ---------------------------------------------------------------------------

/// The LIFO blade stack.
pub struct BladeStack {
    config: StackConfig,
    widths: LayoutConfig,
    entries: Vec<BladeEntry>,
    ids: BladeIdAllocator,
    reservations: Rc<Cell<usize>>,
    generation: u64,
    minimized: bool,
    label: String,
    loading_since: Option<Instant>,
    progress_visible: bool,
    ready_tx: Sender<BladeId>,
    ready_rx: Receiver<BladeId>,
}

impl Default for BladeStack {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

impl fmt::Debug for BladeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BladeStack")
            .field("entries", &self.entries)
            .field("pending", &self.pending_count())
            .field("generation", &self.generation)
            .field("minimized", &self.minimized)
            .field("label", &self.label)
            .field("loading_since", &self.loading_since)
            .field("progress_visible", &self.progress_visible)
            .finish_non_exhaustive()
    }
}

impl BladeStack {
    pub fn new(config: StackConfig) -> Self {
        let (ready_tx, ready_rx) = mpsc::channel();
        Self {
            config,
            widths: LayoutConfig::default(),
            entries: Vec::new(),
            ids: BladeIdAllocator::new(),
            reservations: Rc::new(Cell::new(0)),
            generation: 0,
            minimized: false,
            label: String::new(),
            loading_since: None,
            progress_visible: false,
            ready_tx,
            ready_rx,
        }
    }

    /// Use `widths` for blade widths in the layout plan.
    #[must_use]
    pub fn with_layout(mut self, widths: LayoutConfig) -> Self {
        self.widths = widths;
        self
    }

    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    // --- Read-only signals ---

    /// Number of mounted entries (ready or not).
    #[must_use]
    pub fn stack_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outstanding reservations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.reservations.get()
    }

    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.entries.iter().filter(|e| e.ready).count()
    }

    #[must_use]
    pub fn is_stack_minimized(&self) -> bool {
        self.minimized
    }

    /// Label shown on the minimized stack bar.
    #[must_use]
    pub fn stack_label(&self) -> &str {
        &self.label
    }

    /// z-index of the top-most ready blade's layer.
    ///
    /// `z_base - z_step` when nothing is ready.
    #[must_use]
    pub fn active_blade_z_index(&self) -> i32 {
        let ready = self.ready_count() as i32;
        self.config
            .z_base
            .saturating_add(self.config.z_step.saturating_mul(ready - 1))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending_count() > 0 || self.entries.iter().any(|e| !e.ready)
    }

    /// When the current loading period started.
    #[must_use]
    pub fn loading_since(&self) -> Option<Instant> {
        self.loading_since
    }

    #[must_use]
    pub fn is_progress_visible(&self) -> bool {
        self.progress_visible && self.is_loading()
    }

    /// Entries in open order.
    #[must_use]
    pub fn entries(&self) -> &[BladeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, id: BladeId) -> Option<&BladeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The last-opened entry, ready or not.
    #[must_use]
    pub fn top(&self) -> Option<&BladeEntry> {
        self.entries.last()
    }

    // --- Opening ---

    /// Reserve a slot for a new blade.
    ///
    /// Fails with [`OpenOutcome::CapacityExceeded`] (and no state change) when
    /// mounted entries plus outstanding reservations already reach
    /// `max_depth`. Callers that own followers pair the refusal with
    /// [`restore_for_open`](Self::restore_for_open).
    pub fn begin_open(
        &mut self,
        props: BladeProps,
        label: Option<String>,
        now: Instant,
    ) -> Result<OpenTicket, OpenOutcome> {
        let occupied = self.entries.len() + self.pending_count();
        if occupied >= self.config.max_depth {
            tracing::warn!(
                target: TARGET,
                occupied,
                max_depth = self.config.max_depth,
                "blade open refused: stack is full"
            );
            return Err(OpenOutcome::CapacityExceeded);
        }

        let reservation = Reservation::acquire(&self.reservations);
        if self.loading_since.is_none() {
            self.loading_since = Some(now);
        }
        tracing::debug!(
            target: TARGET,
            generation = self.generation,
            pending = self.pending_count(),
            label = label.as_deref().unwrap_or(""),
            "blade open started"
        );
        Ok(OpenTicket {
            reservation,
            generation: self.generation,
            props,
            label,
            issued_at: now,
        })
    }

    /// Finish an open with the loader's result.
    ///
    /// On success the panel is mounted hidden and handed a [`ReadySignal`].
    /// If the stack was minimized, `followers` first minimize their
    /// stack-controlled blades, then the stack is restored.
    pub fn complete_open(
        &mut self,
        ticket: OpenTicket,
        result: LoadResult,
        now: Instant,
        followers: &mut [&mut dyn StackFollower],
    ) -> OpenOutcome {
        let _span = tracing::debug_span!(
            target: TARGET,
            "blade.open",
            generation = ticket.generation,
        )
        .entered();

        let OpenTicket {
            reservation,
            generation,
            props,
            label,
            issued_at,
        } = ticket;
        drop(reservation);

        if generation != self.generation {
            tracing::debug!(
                target: TARGET,
                ticket_generation = generation,
                current_generation = self.generation,
                "stale blade open discarded"
            );
            self.settle_if_idle();
            return OpenOutcome::Cancelled;
        }

        let mut panel = match result {
            Ok(panel) => panel,
            Err(error) => {
                tracing::error!(
                    target: TARGET,
                    error = %error,
                    waited_ms = now.saturating_duration_since(issued_at).as_millis() as u64,
                    "failed to open blade"
                );
                self.settle_if_idle();
                return OpenOutcome::Rejected(error);
            }
        };

        self.restore_for_open(now, followers);

        if self.entries.len() >= self.config.max_depth {
            tracing::warn!(
                target: TARGET,
                max_depth = self.config.max_depth,
                "loaded blade dropped: stack is full"
            );
            self.settle_if_idle();
            return OpenOutcome::CapacityExceeded;
        }

        let id = self.ids.allocate();
        if let Some(label) = &label {
            self.label.clone_from(label);
        }
        let blade_type = panel.blade_type();
        panel.mount(&props, ReadySignal::new(id, self.ready_tx.clone()));
        self.entries.push(BladeEntry {
            id,
            panel,
            props,
            ready: false,
            label,
            blade_type,
            mounted_at: now,
        });
        tracing::info!(
            target: TARGET,
            id = %id,
            blade_type = blade_type.as_str(),
            count = self.entries.len(),
            "blade opened"
        );

        // Panels that finish synchronously inside `mount` are revealed now.
        self.drain_ready();
        OpenOutcome::Opened(id)
    }

    /// Open an already-resolved panel in one step.
    pub fn open_resolved(
        &mut self,
        result: LoadResult,
        props: BladeProps,
        label: Option<String>,
        now: Instant,
        followers: &mut [&mut dyn StackFollower],
    ) -> OpenOutcome {
        match self.begin_open(props, label, now) {
            Ok(ticket) => self.complete_open(ticket, result, now, followers),
            Err(outcome) => {
                self.restore_for_open(now, followers);
                outcome
            }
        }
    }

    /// Bring a minimized stack back for an incoming open.
    ///
    /// `followers` first minimize their stack-controlled blades, then the
    /// stack is shown. This also happens when the open itself is refused for
    /// capacity; the entries stay as they are. Returns whether the stack was
    /// minimized.
    pub fn restore_for_open(
        &mut self,
        now: Instant,
        followers: &mut [&mut dyn StackFollower],
    ) -> bool {
        if !self.minimized {
            return false;
        }
        for follower in followers.iter_mut() {
            let changed = follower.minimize_stack_controlled(now);
            if changed > 0 {
                tracing::debug!(
                    target: TARGET,
                    kind = follower.blade_type().as_str(),
                    changed,
                    "stack-controlled blades minimized for restore"
                );
            }
        }
        self.minimized = false;
        true
    }

    /// Invalidate every outstanding ticket. Returns how many were pending.
    pub fn cancel_pending(&mut self) -> usize {
        let pending = self.pending_count();
        self.generation += 1;
        self.reservations = Rc::new(Cell::new(0));
        self.settle_if_idle();
        if pending > 0 {
            tracing::debug!(
                target: TARGET,
                pending,
                generation = self.generation,
                "pending blade opens cancelled"
            );
        }
        pending
    }

    // --- Readiness ---

    /// Reveal a blade. Returns `false` if it is unknown or already ready.
    pub fn mark_ready(&mut self, id: BladeId) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            tracing::trace!(target: TARGET, id = %id, "ready signal for unknown blade");
            return false;
        };
        if entry.ready {
            return false;
        }
        entry.ready = true;
        tracing::debug!(target: TARGET, id = %id, "blade ready");
        self.settle_if_idle();
        true
    }

    /// Apply every ready signal received so far. Returns the blades revealed.
    pub fn drain_ready(&mut self) -> Vec<BladeId> {
        let received: Vec<BladeId> = self.ready_rx.try_iter().collect();
        received
            .into_iter()
            .filter(|id| self.mark_ready(*id))
            .collect()
    }

    // --- Closing and minimizing ---

    /// Pop the last-opened blade. No-op on an empty stack.
    pub fn close_top_blade(&mut self) -> Option<BladeId> {
        let entry = self.entries.pop()?;
        tracing::debug!(
            target: TARGET,
            id = %entry.id,
            remaining = self.entries.len(),
            "blade closed"
        );
        self.settle_if_idle();
        Some(entry.id)
    }

    /// Hide the whole stack behind a dock bar. Entries stay mounted.
    pub fn minimize_stack(&mut self) {
        if let Some(label) = self.entries.last().and_then(|e| e.label.clone()) {
            self.label = label;
        }
        self.minimized = true;
        tracing::debug!(target: TARGET, label = %self.label, "stack minimized");
    }

    pub fn maximize_stack(&mut self) {
        self.minimized = false;
        tracing::debug!(target: TARGET, "stack restored");
    }

    // --- Time ---

    /// Advance timers: apply ready signals, drop timed-out blades, and toggle
    /// the progress bar.
    pub fn tick(&mut self, now: Instant) -> Vec<StackEvent> {
        let mut events = Vec::new();
        self.drain_ready();

        if let Some(timeout) = self.config.ready_timeout_duration() {
            let before = self.entries.len();
            let mut timed_out = Vec::new();
            self.entries.retain(|e| {
                let expired = !e.ready && now.saturating_duration_since(e.mounted_at) >= timeout;
                if expired {
                    timed_out.push(e.id);
                }
                !expired
            });
            for id in timed_out {
                tracing::warn!(
                    target: TARGET,
                    id = %id,
                    timeout_ms = timeout.as_millis() as u64,
                    "blade never became ready; removed"
                );
                events.push(StackEvent::ReadyTimedOut(id));
            }
            if self.entries.len() != before {
                self.settle_if_idle();
            }
        }

        if self.is_loading() {
            let since = *self.loading_since.get_or_insert(now);
            if !self.progress_visible
                && now.saturating_duration_since(since) >= self.config.progress_delay_duration()
            {
                self.progress_visible = true;
                events.push(StackEvent::ProgressShown);
            }
        } else {
            self.loading_since = None;
            if self.progress_visible {
                self.progress_visible = false;
                events.push(StackEvent::ProgressHidden);
            }
        }
        events
    }

    fn settle_if_idle(&mut self) {
        if !self.is_loading() {
            self.loading_since = None;
        }
    }

    // --- Input ---

    /// React to input while the stack is showing.
    ///
    /// Escape closes the top blade. A primary click on the top overlay closes
    /// it too; clicks on the loading veil are absorbed. Everything else is
    /// left to the panels.
    pub fn handle_event(&mut self, event: &Event, layout: &StackLayout) -> Option<StackAction> {
        if self.minimized || self.entries.is_empty() {
            return None;
        }
        if event.is_escape_press() {
            return self.close_top_blade().map(StackAction::Closed);
        }
        let (x, y) = event.primary_click()?;
        match layout.hit_test(x, y)? {
            StackHit::Overlay(_) => self.close_top_blade().map(StackAction::Closed),
            StackHit::LoadingVeil => Some(StackAction::Absorbed),
            StackHit::Panel(_) => None,
        }
    }

    // --- Layout ---

    /// The layout plan for the current state.
    #[must_use]
    pub fn layout(&self, viewport: Viewport) -> StackLayout {
        let summaries: Vec<EntrySummary> = self.entries.iter().map(BladeEntry::summary).collect();
        StackLayout::plan(
            &self.config,
            &self.widths,
            viewport,
            &summaries,
            PlanState {
                minimized: self.minimized,
                loading: self.is_loading(),
                progress_visible: self.is_progress_visible(),
                active_z_index: self.active_blade_z_index(),
            },
        )
    }

    /// z-index for a blade drawn outside the stack.
    #[must_use]
    pub fn standalone_z_index(&self, explicit: Option<i32>) -> i32 {
        explicit.unwrap_or_else(|| {
            self.active_blade_z_index()
                .saturating_add(self.config.standalone_z_lift)
        })
    }

    /// z-indices and overlay opacity for a blade drawn outside the stack.
    #[must_use]
    pub fn standalone_layer(&self, explicit: Option<i32>) -> StandaloneLayer {
        let z_index = self.standalone_z_index(explicit);
        StandaloneLayer {
            z_index,
            overlay_z_index: z_index - 1,
            overlay_opacity: self.config.standalone_overlay_opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blade_core::{Duration, KeyCode, KeyEvent, KeyEventKind};

    struct TestPanel {
        kind: BladeType,
        ready_on_mount: bool,
        _signal: Option<ReadySignal>,
    }

    impl TestPanel {
        fn deferred() -> Self {
            Self {
                kind: BladeType::View,
                ready_on_mount: false,
                _signal: None,
            }
        }

        fn instant() -> Self {
            Self {
                ready_on_mount: true,
                ..Self::deferred()
            }
        }
    }

    impl BladePanel for TestPanel {
        fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
            if self.ready_on_mount {
                ready.notify();
            } else {
                self._signal = Some(ready);
            }
        }

        fn blade_type(&self) -> BladeType {
            self.kind
        }
    }

    fn ok(panel: TestPanel) -> LoadResult {
        Ok(Box::new(panel))
    }

    fn open(stack: &mut BladeStack, panel: TestPanel, label: Option<&str>, now: Instant) -> OpenOutcome {
        stack.open_resolved(ok(panel), BladeProps::new(), label.map(str::to_owned), now, &mut [])
    }

    // --- Open / capacity ---

    #[test]
    fn open_mounts_hidden_until_ready() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let id = open(&mut stack, TestPanel::deferred(), None, now).opened_id().unwrap();
        assert_eq!(stack.stack_count(), 1);
        assert!(!stack.entry(id).unwrap().is_ready());
        assert!(stack.is_loading());
        assert!(stack.mark_ready(id));
        assert!(!stack.mark_ready(id));
        assert!(!stack.is_loading());
        assert_eq!(stack.loading_since(), None);
    }

    #[test]
    fn synchronous_ready_is_applied_on_open() {
        let mut stack = BladeStack::default();
        let id = open(&mut stack, TestPanel::instant(), None, Instant::now()).opened_id().unwrap();
        assert!(stack.entry(id).unwrap().is_ready());
        assert_eq!(stack.active_blade_z_index(), 1000);
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let a = open(&mut stack, TestPanel::instant(), None, now).opened_id().unwrap();
        let b = open(&mut stack, TestPanel::instant(), None, now).opened_id().unwrap();
        assert!(b > a);
    }

    #[test]
    fn sixth_open_is_refused_without_state_change() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        for _ in 0..5 {
            assert!(open(&mut stack, TestPanel::instant(), None, now).is_opened());
        }
        let outcome = open(&mut stack, TestPanel::instant(), Some("extra"), now);
        assert!(matches!(outcome, OpenOutcome::CapacityExceeded));
        assert_eq!(stack.stack_count(), 5);
        assert_eq!(stack.stack_label(), "");
        assert_eq!(stack.pending_count(), 0);
    }

    #[test]
    fn reservations_count_against_capacity() {
        let mut stack = BladeStack::new(StackConfig::new().max_depth(2));
        let now = Instant::now();
        let t1 = stack.begin_open(BladeProps::new(), None, now).unwrap();
        let t2 = stack.begin_open(BladeProps::new(), None, now).unwrap();
        assert!(matches!(
            stack.begin_open(BladeProps::new(), None, now),
            Err(OpenOutcome::CapacityExceeded)
        ));
        drop(t1);
        assert_eq!(stack.pending_count(), 1);
        assert!(
            stack
                .complete_open(t2, ok(TestPanel::instant()), now, &mut [])
                .is_opened()
        );
        assert_eq!(stack.pending_count(), 0);
    }

    #[test]
    fn rejection_releases_slot_and_settles() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let ticket = stack.begin_open(BladeProps::new(), None, now).unwrap();
        assert!(stack.is_loading());
        let outcome = stack.complete_open(ticket, Err(LoadError::new("boom")), now, &mut []);
        match outcome {
            OpenOutcome::Rejected(err) => assert_eq!(err.message(), "boom"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stack.stack_count(), 0);
        assert!(!stack.is_loading());
        assert_eq!(stack.loading_since(), None);
    }

    #[test]
    fn cancelled_tickets_complete_as_cancelled() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let ticket = stack.begin_open(BladeProps::new(), None, now).unwrap();
        assert_eq!(stack.cancel_pending(), 1);
        assert_eq!(stack.pending_count(), 0);
        let outcome = stack.complete_open(ticket, ok(TestPanel::instant()), now, &mut []);
        assert!(matches!(outcome, OpenOutcome::Cancelled));
        assert!(stack.is_empty());
        // The stale ticket releasing its slot does not disturb the new pool.
        assert_eq!(stack.pending_count(), 0);
    }

    #[test]
    fn label_updates_only_when_given() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), Some("Reports"), now);
        open(&mut stack, TestPanel::instant(), None, now);
        assert_eq!(stack.stack_label(), "Reports");
    }

    // --- Close ---

    #[test]
    fn close_on_empty_is_noop() {
        let mut stack = BladeStack::default();
        assert_eq!(stack.close_top_blade(), None);
        assert_eq!(stack.stack_count(), 0);
    }

    #[test]
    fn close_pops_last_opened() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let a = open(&mut stack, TestPanel::instant(), None, now).opened_id().unwrap();
        let b = open(&mut stack, TestPanel::instant(), None, now).opened_id().unwrap();
        assert_eq!(stack.close_top_blade(), Some(b));
        assert_eq!(stack.top().map(BladeEntry::id), Some(a));
    }

    // --- Minimize ---

    #[test]
    fn minimize_uses_top_label_with_fallback() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), Some("Q3 report"), now);
        stack.minimize_stack();
        assert!(stack.is_stack_minimized());
        assert_eq!(stack.stack_label(), "Q3 report");
        stack.maximize_stack();

        open(&mut stack, TestPanel::instant(), None, now);
        stack.minimize_stack();
        assert_eq!(stack.stack_label(), "Q3 report");
        assert_eq!(stack.stack_count(), 2);
    }

    struct CountingFollower(usize);

    impl StackFollower for CountingFollower {
        fn blade_type(&self) -> BladeType {
            BladeType::Edit
        }

        fn minimize_stack_controlled(&mut self, _now: Instant) -> usize {
            self.0 += 1;
            1
        }
    }

    #[test]
    fn open_while_minimized_notifies_followers_and_restores() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        let mut follower = CountingFollower(0);
        stack.minimize_stack();
        let outcome = stack.open_resolved(
            ok(TestPanel::instant()),
            BladeProps::new(),
            None,
            now,
            &mut [&mut follower],
        );
        assert!(outcome.is_opened());
        assert!(!stack.is_stack_minimized());
        assert_eq!(follower.0, 1);

        // Not minimized: followers are left alone.
        stack.open_resolved(ok(TestPanel::instant()), BladeProps::new(), None, now, &mut [&mut follower]);
        assert_eq!(follower.0, 1);
    }

    #[test]
    fn refused_open_still_restores_minimized_stack() {
        let mut stack = BladeStack::new(StackConfig::new().max_depth(1));
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), Some("only"), now);
        stack.minimize_stack();
        let mut follower = CountingFollower(0);
        let refused = stack.open_resolved(
            ok(TestPanel::instant()),
            BladeProps::new(),
            Some("extra".to_string()),
            now,
            &mut [&mut follower],
        );
        assert!(matches!(refused, OpenOutcome::CapacityExceeded));
        assert!(!stack.is_stack_minimized());
        assert_eq!(follower.0, 1);
        assert_eq!(stack.stack_count(), 1);
        assert_eq!(stack.stack_label(), "only");
        assert!(!stack.restore_for_open(now, &mut [&mut follower]));
        assert_eq!(follower.0, 1);
    }

    // --- z-index ---

    #[test]
    fn active_z_index_tracks_ready_count() {
        let mut stack = BladeStack::default();
        assert_eq!(stack.active_blade_z_index(), 990);
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), None, now);
        open(&mut stack, TestPanel::deferred(), None, now);
        assert_eq!(stack.active_blade_z_index(), 1000);
        open(&mut stack, TestPanel::instant(), None, now);
        assert_eq!(stack.active_blade_z_index(), 1010);
    }

    #[test]
    fn standalone_layer_sits_above_active() {
        let mut stack = BladeStack::default();
        open(&mut stack, TestPanel::instant(), None, Instant::now());
        assert_eq!(stack.standalone_z_index(None), 1005);
        assert_eq!(stack.standalone_z_index(Some(77)), 77);
        let layer = stack.standalone_layer(None);
        assert_eq!(layer.overlay_z_index, 1004);
        assert!((layer.overlay_opacity - 0.48).abs() < 1e-6);
    }

    // --- Timers ---

    #[test]
    fn progress_appears_after_delay_and_clears_on_settle() {
        let mut stack = BladeStack::default();
        let t0 = Instant::now();
        let id = open(&mut stack, TestPanel::deferred(), None, t0).opened_id().unwrap();
        assert!(stack.tick(t0 + Duration::from_millis(1999)).is_empty());
        assert_eq!(
            stack.tick(t0 + Duration::from_millis(2000)),
            vec![StackEvent::ProgressShown]
        );
        assert!(stack.is_progress_visible());
        stack.mark_ready(id);
        assert!(!stack.is_progress_visible());
        assert_eq!(
            stack.tick(t0 + Duration::from_millis(2100)),
            vec![StackEvent::ProgressHidden]
        );
    }

    #[test]
    fn unready_blade_times_out() {
        let mut stack = BladeStack::new(StackConfig::new().ready_timeout(Some(Duration::from_secs(5))));
        let t0 = Instant::now();
        let stuck = open(&mut stack, TestPanel::deferred(), None, t0).opened_id().unwrap();
        let fine = open(&mut stack, TestPanel::instant(), None, t0).opened_id().unwrap();
        let events = stack.tick(t0 + Duration::from_secs(5));
        assert!(events.contains(&StackEvent::ReadyTimedOut(stuck)));
        assert_eq!(stack.stack_count(), 1);
        assert_eq!(stack.top().unwrap().id(), fine);
        assert!(!stack.is_loading());
    }

    #[test]
    fn no_timeout_keeps_hidden_blades() {
        let mut stack = BladeStack::new(StackConfig::new().ready_timeout(None));
        let t0 = Instant::now();
        open(&mut stack, TestPanel::deferred(), None, t0);
        stack.tick(t0 + Duration::from_secs(3600));
        assert_eq!(stack.stack_count(), 1);
    }

    #[test]
    fn deferred_signal_is_drained_on_tick() {
        let mut stack = BladeStack::default();
        let t0 = Instant::now();
        let (tx, rx) = mpsc::channel::<ReadySignal>();

        struct Forwarding(Sender<ReadySignal>);
        impl BladePanel for Forwarding {
            fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
                let _ = self.0.send(ready);
            }
        }

        let id = stack
            .open_resolved(Ok(Box::new(Forwarding(tx))), BladeProps::new(), None, t0, &mut [])
            .opened_id()
            .unwrap();
        rx.recv().unwrap().notify();
        assert!(!stack.entry(id).unwrap().is_ready());
        stack.tick(t0);
        assert!(stack.entry(id).unwrap().is_ready());
    }

    // --- Input ---

    #[test]
    fn escape_closes_exactly_one() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        for _ in 0..3 {
            open(&mut stack, TestPanel::instant(), None, now);
        }
        let layout = stack.layout(Viewport::default());
        let action = stack.handle_event(&Event::key(KeyCode::Escape), &layout);
        assert!(matches!(action, Some(StackAction::Closed(_))));
        assert_eq!(stack.stack_count(), 2);

        let release = Event::Key(KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release));
        assert_eq!(stack.handle_event(&release, &layout), None);
        assert_eq!(stack.stack_count(), 2);
    }

    #[test]
    fn escape_ignored_while_minimized() {
        let mut stack = BladeStack::default();
        open(&mut stack, TestPanel::instant(), None, Instant::now());
        stack.minimize_stack();
        let layout = stack.layout(Viewport::default());
        assert_eq!(stack.handle_event(&Event::key(KeyCode::Escape), &layout), None);
        assert_eq!(stack.stack_count(), 1);
    }

    #[test]
    fn overlay_click_closes_panel_click_does_not() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), None, now);
        let layout = stack.layout(Viewport::default());
        assert_eq!(stack.handle_event(&Event::click(1800, 400), &layout), None);
        assert_eq!(stack.stack_count(), 1);
        assert!(matches!(
            stack.handle_event(&Event::click(20, 400), &layout),
            Some(StackAction::Closed(_))
        ));
        assert!(stack.is_empty());
    }

    #[test]
    fn clicks_on_veil_are_absorbed() {
        let mut stack = BladeStack::default();
        let now = Instant::now();
        open(&mut stack, TestPanel::instant(), None, now);
        open(&mut stack, TestPanel::deferred(), None, now);
        let layout = stack.layout(Viewport::default());
        assert_eq!(
            stack.handle_event(&Event::click(20, 400), &layout),
            Some(StackAction::Absorbed)
        );
        assert_eq!(stack.stack_count(), 2);
    }
}
