#![forbid(unsafe_code)]

//! Per-type blade registries.
//!
//! Standalone blades (editors and read-only views that are not hosted by the
//! blade stack) are tracked in a registry keyed by business-entity id. Each
//! registry keeps its own monotonic z-index counter so "bring to front" is a
//! pure state transition, and exposes the minimized subset for the dock.
//!
//! Two instances exist in a workspace: [`EditBlades`] and [`ViewBlades`]. They
//! share one implementation, [`BladeRegistry`], parameterised by a
//! [`RegistryKind`] marker.
//!
//! # Invariants
//!
//! 1. At most one entry per id; reopening raises the existing entry.
//! 2. The z-index counter never decreases.
//! 3. Every raise produces a z-index strictly greater than any the registry has
//!    handed out before (unless the caller supplies an explicit override).

pub mod kind;
pub mod registry;
pub mod state;

pub use kind::{EditKind, RegistryKind, ViewKind};
pub use registry::{BladeRegistry, EditBlades, OpenResult, ViewBlades};
pub use state::{BladeState, BladeUpdate, OpenOptions};
