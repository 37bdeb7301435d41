#![forbid(unsafe_code)]

//! Blade stack engine.
//!
//! A LIFO stack of slide-in panels ("blades"). Opening a blade resolves its
//! panel through an async loader, mounts it hidden, and reveals it once the
//! panel reports that its own data is ready. Ready blades fan out to the left
//! with a darkening overlay; only the top-most one is interactive. Escape, or a
//! click on the top overlay, closes the top blade.
//!
//! # Role
//!
//! The engine is pure state. Hosts feed it loader results, input events, and
//! the current time; it answers with a [`StackLayout`] (what to draw, where,
//! and at which z-index) and with [`StackAction`]s / [`StackEvent`]s.
//!
//! # Modules
//!
//! - [`panel`]: the [`BladePanel`] capability trait, [`ReadySignal`], props.
//! - [`loader`]: loader result types and ready-made loaders.
//! - [`stack`]: the [`BladeStack`] state machine.
//! - [`layout`]: the layout plan and hit testing.

pub mod layout;
pub mod loader;
pub mod panel;
pub mod stack;

pub use layout::{Layer, Overlay, Placement, StackHit, StackLayout, StandaloneLayer, VisibleBlade};
pub use loader::{BladeLoader, LoadError, LoadResult};
pub use panel::{BladePanel, BladeProps, ReadySignal};
pub use stack::{BladeEntry, BladeStack, OpenOutcome, OpenTicket, StackAction, StackEvent};
