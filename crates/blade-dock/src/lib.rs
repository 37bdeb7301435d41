#![forbid(unsafe_code)]

//! Minimized dock.
//!
//! The dock composites restore bars along the bottom-right edge: one for the
//! minimized blade stack, then one per minimized edit or view blade in the
//! order they were minimized. Restoring a bar brings its blade back; closing a
//! dirty edit bar first asks for confirmation through the
//! [`UnsavedChangesDialog`].
//!
//! # Invariants
//!
//! 1. The stack bar, when present, is always the first item.
//! 2. Registry bars are sorted by `minimized_at`, edit before view on ties.
//! 3. At most one confirmation is pending at a time.

pub mod dialog;
pub mod dock;
pub mod layout;

pub use dialog::UnsavedChangesDialog;
pub use dock::{CloseOutcome, DockItem, DockTarget, MinimizedDock};
pub use layout::{DockHit, DockLayout, DockSlot};
