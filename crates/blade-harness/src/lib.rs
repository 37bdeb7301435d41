#![forbid(unsafe_code)]

//! Scenario replay for the blade navigation engine.
//!
//! A scenario (TOML or JSON) scripts opens, loader settlements, readiness,
//! input, clock advances, registry and dock operations, and expectations.
//! The [`Runner`] replays it against a fresh [`bladestack::Workspace`] with a
//! manual clock, records a [`Snapshot`] per step, and fingerprints the JSONL
//! trace with blake3 so regressions show up as digest changes.

pub mod cli;
pub mod error;
pub mod runner;
pub mod scenario;
pub mod snapshot;

pub use cli::{run, run_from_env};
pub use error::{HarnessError, Result};
pub use runner::Runner;
pub use scenario::{Expectation, LoaderMode, RegistryAction, Scenario, SignalMode, Step};
pub use snapshot::{BladeSnapshot, RegistrySnapshot, Snapshot, Trace};
