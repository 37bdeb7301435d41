#![forbid(unsafe_code)]

//! Core: shared vocabulary for the bladestack crates.
//!
//! # Role in bladestack
//! `blade-core` is the leaf crate. It owns the types every other crate agrees
//! on so that the stack engine, the per-type registries, and the minimized dock
//! can be compiled and tested independently.
//!
//! # Primary responsibilities
//! - **BladeId**: process-unique, strictly increasing stack entry ids.
//! - **Event**: canonical input events (keys, mouse) the engine reacts to.
//! - **Geometry**: logical-pixel rectangles and viewports for layout plans.
//! - **BladeType**: view/edit blade families and their width rules.
//! - **BladeConfig**: every tunable constant, loadable from TOML or JSON.
//! - **StackFollower**: the seam through which registries follow the stack.

pub mod config;
pub mod event;
pub mod follower;
pub mod geometry;
pub mod id;
pub mod kind;

pub use config::{BladeConfig, ConfigError, DockConfig, LayoutConfig, RegistryConfig, StackConfig};
pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use follower::StackFollower;
pub use geometry::{Rect, Viewport};
pub use id::{BladeId, BladeIdAllocator};
pub use kind::{BladeType, WidthRule, WidthStep};

/// Re-exported so downstream crates and tests agree on one clock type.
pub use web_time::{Duration, Instant};
