#![forbid(unsafe_code)]

//! Async opens through [`BladeHost`]: concurrent races, unmount, deferred
//! readiness, and the registry cascade on open-after-minimize.
//!
//! Run:
//!   cargo test -p bladestack --test host_async

use std::cell::RefCell;
use std::rc::Rc;

use bladestack::prelude::*;
use bladestack::{Duration, OpenOptions, StackEvent};
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::join;

// ============================================================================
// Panels
// ============================================================================

struct ReadyNow;

impl BladePanel for ReadyNow {
    fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
        ready.notify();
    }
}

/// Parks its ready signal where the test can fire it later.
struct Deferred(Rc<RefCell<Option<ReadySignal>>>);

impl BladePanel for Deferred {
    fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
        *self.0.borrow_mut() = Some(ready);
    }
}

fn ready_panel() -> bladestack::LoadResult {
    Ok(Box::new(ReadyNow))
}

fn open_ready(host: &BladeHost, label: &str) -> OpenOutcome {
    block_on(host.open_blade(
        || async { ready_panel() },
        BladeProps::new(),
        Some(label.into()),
    ))
}

// ============================================================================
// Capacity race
// ============================================================================

#[test]
fn concurrent_opens_at_depth_four_admit_exactly_one() {
    let host = BladeHost::default();
    for i in 0..4 {
        assert!(open_ready(&host, &format!("B{i}")).is_opened());
    }

    let (tx_a, rx_a) = oneshot::channel::<()>();
    let (tx_b, rx_b) = oneshot::channel::<()>();
    let first = host.open_blade(
        move || async move {
            let _ = rx_a.await;
            ready_panel()
        },
        BladeProps::new(),
        None,
    );
    let second = host.open_blade(
        move || async move {
            let _ = rx_b.await;
            ready_panel()
        },
        BladeProps::new(),
        None,
    );
    let release = async {
        let _ = tx_a.send(());
        let _ = tx_b.send(());
    };

    let (a, b, ()) = block_on(async { join!(first, second, release) });
    let mut kinds = [a.kind(), b.kind()];
    kinds.sort_unstable();
    assert_eq!(kinds, ["capacity_exceeded", "opened"]);
    assert_eq!(host.borrow().stack().stack_count(), 5);
    assert_eq!(host.borrow().stack().pending_count(), 0);
}

#[test]
fn six_opens_cap_at_five() {
    let host = BladeHost::default();
    let outcomes: Vec<OpenOutcome> = (0..6).map(|i| open_ready(&host, &i.to_string())).collect();
    assert_eq!(outcomes.iter().filter(|o| o.is_opened()).count(), 5);
    assert_eq!(outcomes[5].kind(), "capacity_exceeded");
    assert_eq!(host.borrow().stack().stack_count(), 5);
}

// ============================================================================
// Unmount
// ============================================================================

#[test]
fn unmount_cancels_in_flight_opens() {
    let host = BladeHost::default();
    let (tx, rx) = oneshot::channel::<()>();
    let pending = host.open_blade(
        move || async move {
            let _ = rx.await;
            ready_panel()
        },
        BladeProps::new(),
        Some("Late".into()),
    );
    let unmount = {
        let host = host.clone();
        async move {
            // The open above has already reserved its slot.
            assert_eq!(host.borrow().stack().pending_count(), 1);
            assert_eq!(host.unmount(), 1);
            let _ = tx.send(());
        }
    };

    let (outcome, ()) = block_on(async { join!(pending, unmount) });
    assert_eq!(outcome.kind(), "cancelled");
    let ws = host.borrow();
    assert!(ws.stack().is_empty());
    assert!(!ws.stack().is_loading());
}

// ============================================================================
// Readiness
// ============================================================================

#[test]
fn deferred_ready_reveals_on_tick() {
    let now = Rc::new(RefCell::new(Instant::now()));
    let clock = Rc::clone(&now);
    let host = BladeHost::default().with_clock(move || *clock.borrow());
    let slot = Rc::new(RefCell::new(None));

    let panel = Deferred(Rc::clone(&slot));
    let outcome = block_on(host.open_blade(
        move || async move { Ok(Box::new(panel) as Box<dyn BladePanel>) },
        BladeProps::new().with("reportId", 42),
        Some("Deferred".into()),
    ));
    let id = outcome.opened_id().unwrap();
    assert!(host.borrow().stack().is_loading());
    assert!(host.borrow().layout().top().is_none());

    // Past the progress delay, still not ready.
    *now.borrow_mut() += Duration::from_millis(2_100);
    assert_eq!(host.tick(), vec![StackEvent::ProgressShown]);
    assert!(host.borrow().stack().is_progress_visible());

    slot.borrow_mut().take().unwrap().notify();
    assert_eq!(host.tick(), vec![StackEvent::ProgressHidden]);
    let ws = host.borrow();
    assert_eq!(ws.layout().top().map(|b| b.id), Some(id));
    assert_eq!(ws.stack().active_blade_z_index(), 1000);
}

#[test]
fn silent_panel_is_dropped_after_ready_timeout() {
    let now = Rc::new(RefCell::new(Instant::now()));
    let clock = Rc::clone(&now);
    let host = BladeHost::default().with_clock(move || *clock.borrow());
    let slot = Rc::new(RefCell::new(None));
    let panel = Deferred(Rc::clone(&slot));

    let id = block_on(host.open_blade(
        move || async move { Ok(Box::new(panel) as Box<dyn BladePanel>) },
        BladeProps::new(),
        None,
    ))
    .opened_id()
    .unwrap();

    *now.borrow_mut() += Duration::from_secs(31);
    let events = host.tick();
    assert!(events.contains(&StackEvent::ReadyTimedOut(id)));
    assert!(host.borrow().stack().is_empty());
}

// ============================================================================
// Registry cascade
// ============================================================================

#[test]
fn open_after_minimize_restores_stack_and_hides_followers() {
    let host = BladeHost::default();
    open_ready(&host, "Reports");
    host.with(|ws| {
        ws.edit_blades_mut()
            .unwrap()
            .open_blade("e1", None, OpenOptions::new().stack_controlled(true));
        ws.view_blades_mut()
            .unwrap()
            .open_blade("v1", None, OpenOptions::new().stack_controlled(true));
        ws.view_blades_mut().unwrap().open_blade("v2", None, OpenOptions::new());
        ws.minimize_stack();
    });

    assert!(open_ready(&host, "Details").is_opened());

    let ws = host.borrow();
    assert!(!ws.stack().is_stack_minimized());
    assert_eq!(ws.stack().stack_count(), 2);
    assert!(ws.edit_blades().unwrap().get_blade("e1").unwrap().is_minimized);
    assert!(ws.view_blades().unwrap().get_blade("v1").unwrap().is_minimized);
    assert!(!ws.view_blades().unwrap().get_blade("v2").unwrap().is_minimized);
}

#[test]
fn cascade_skips_unmounted_registries() {
    let host = BladeHost::new(Workspace::default().without_view_registry());
    open_ready(&host, "A");
    host.with(|ws| {
        ws.edit_blades_mut()
            .unwrap()
            .open_blade("e1", None, OpenOptions::new().stack_controlled(true));
        ws.minimize_stack();
    });
    assert!(open_ready(&host, "B").is_opened());
    assert!(host.borrow().edit_blades().unwrap().get_blade("e1").unwrap().is_minimized);
}
