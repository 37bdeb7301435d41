#![forbid(unsafe_code)]

//! Async host: run loaders against a shared [`Workspace`].
//!
//! # Design
//!
//! [`BladeHost`] is a cloneable handle to `Rc<RefCell<Workspace>>` plus a
//! clock. [`BladeHost::open_blade`] reserves a slot, awaits the loader with no
//! borrow held, then completes the open. Several opens may be in flight at
//! once on a single-threaded executor; the stack's reservations keep them
//! within `max_depth`.
//!
//! # Failure Modes
//!
//! - **Re-entrant borrow**: calling into the host from inside
//!   [`BladeHost::with`] panics (RefCell borrow rules).
//! - **Unmount**: [`BladeHost::unmount`] invalidates every in-flight open;
//!   their futures still run to completion but resolve to
//!   [`OpenOutcome::Cancelled`] without touching the stack.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use blade_stack::{BladeLoader, BladeProps, LoadResult, OpenOutcome};
use web_time::Instant;

use crate::workspace::Workspace;

type Clock = Rc<dyn Fn() -> Instant>;

/// Shared handle that opens blades asynchronously.
///
/// Cloning a `BladeHost` creates a new handle to the same workspace.
pub struct BladeHost {
    workspace: Rc<RefCell<Workspace>>,
    clock: Clock,
}

// Manual Clone: shares the same Rc.
impl Clone for BladeHost {
    fn clone(&self) -> Self {
        Self {
            workspace: Rc::clone(&self.workspace),
            clock: Rc::clone(&self.clock),
        }
    }
}

impl fmt::Debug for BladeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ws = self.workspace.borrow();
        f.debug_struct("BladeHost")
            .field("stack_count", &ws.stack().stack_count())
            .field("pending", &ws.stack().pending_count())
            .field("handles", &Rc::strong_count(&self.workspace))
            .finish()
    }
}

impl Default for BladeHost {
    fn default() -> Self {
        Self::new(Workspace::default())
    }
}

impl BladeHost {
    /// Host `workspace`, reading time from the system clock.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Rc::new(RefCell::new(workspace)),
            clock: Rc::new(Instant::now),
        }
    }

    /// Replace the clock. Tests and replays pass a manual one.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> Instant + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Current time according to the host clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        (self.clock)()
    }

    /// Borrow the workspace.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Workspace> {
        self.workspace.borrow()
    }

    /// Run `f` with the workspace mutably borrowed.
    pub fn with<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        f(&mut self.workspace.borrow_mut())
    }

    /// Open a blade: reserve, await `loader`, then mount.
    ///
    /// Returns [`OpenOutcome::CapacityExceeded`] without calling `loader`
    /// when the stack is full.
    pub async fn open_blade<F, Fut>(
        &self,
        loader: F,
        props: BladeProps,
        label: Option<String>,
    ) -> OpenOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LoadResult>,
    {
        let began = self
            .workspace
            .borrow_mut()
            .begin_open(props, label, self.now());
        let ticket = match began {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };

        let result = loader().await;

        let now = self.now();
        self.workspace.borrow_mut().complete_open(ticket, result, now)
    }

    /// [`open_blade`](Self::open_blade) for a type-erased loader.
    pub async fn open_boxed(
        &self,
        loader: BladeLoader,
        props: BladeProps,
        label: Option<String>,
    ) -> OpenOutcome {
        self.open_blade(loader, props, label).await
    }

    /// Advance timers with the host clock.
    pub fn tick(&self) -> Vec<blade_stack::StackEvent> {
        let now = self.now();
        self.workspace.borrow_mut().tick(now)
    }

    /// The host went away: in-flight opens resolve to `Cancelled`.
    pub fn unmount(&self) -> usize {
        let cancelled = self.workspace.borrow_mut().cancel_pending();
        tracing::debug!(target: "bladestack.workspace", cancelled, "blade host unmounted");
        cancelled
    }
}
