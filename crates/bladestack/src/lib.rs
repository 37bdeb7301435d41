#![forbid(unsafe_code)]
//! Blade navigation engine public facade.
//!
//! This crate wires the stack, the edit/view registries, and the minimized
//! dock into one [`Workspace`], offers an async [`BladeHost`] for running
//! loaders, and re-exports the types hosts use day to day.
//!
//! ```
//! use bladestack::prelude::*;
//!
//! struct Report;
//!
//! impl BladePanel for Report {
//!     fn mount(&mut self, _props: &BladeProps, ready: ReadySignal) {
//!         ready.notify();
//!     }
//! }
//!
//! let host = BladeHost::default();
//! let outcome = futures::executor::block_on(host.open_boxed(
//!     loader::immediate(Report),
//!     BladeProps::new().with("reportId", 7),
//!     Some("Monthly".into()),
//! ));
//! assert!(outcome.is_opened());
//! assert_eq!(host.borrow().stack().stack_label(), "Monthly");
//! ```

pub mod error;
pub mod host;
pub mod workspace;

pub use error::{Error, Result};
pub use host::BladeHost;
pub use workspace::{Workspace, WorkspaceAction};

// --- Core re-exports -------------------------------------------------------

pub use blade_core::{
    BladeConfig, BladeId, BladeType, ConfigError, DockConfig, Duration, Event, Instant, KeyCode,
    KeyEvent, LayoutConfig, Rect, RegistryConfig, StackConfig, StackFollower, Viewport,
};

// --- Stack re-exports ------------------------------------------------------

pub use blade_stack::loader;
pub use blade_stack::{
    BladeLoader, BladePanel, BladeProps, BladeStack, LoadError, LoadResult, OpenOutcome,
    OpenTicket, Placement, ReadySignal, StackAction, StackEvent, StackHit, StackLayout,
    StandaloneLayer, VisibleBlade,
};

// --- Registry re-exports ---------------------------------------------------

pub use blade_registry::{BladeState, BladeUpdate, EditBlades, OpenOptions, ViewBlades};

// --- Dock re-exports -------------------------------------------------------

pub use blade_dock::{CloseOutcome, DockHit, DockItem, DockLayout, DockTarget, UnsavedChangesDialog};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BladeConfig, BladeHost, BladePanel, BladeProps, BladeType, DockTarget, Error, Event,
        Instant, KeyCode, OpenOptions, OpenOutcome, ReadySignal, Result, StackAction, Viewport,
        Workspace, WorkspaceAction, loader,
    };
    pub use crate::{core, dock, registry, stack};
}

pub use blade_core as core;
pub use blade_dock as dock;
pub use blade_registry as registry;
pub use blade_stack as stack;
