#![forbid(unsafe_code)]

//! The registry itself.
//!
//! # Invariants
//!
//! 1. `blades` holds at most one entry per id, in insertion order.
//! 2. `z_counter` only grows; each insert and bring-to-front adds `z_step`.
//! 3. `minimized_at` is `Some` exactly while `is_minimized` is true, unless a
//!    caller breaks the pairing through `update_blade_state`.
//!
//! # Failure Modes
//!
//! Operations on unknown ids are no-ops that return `false` / `None`; the
//! registry never panics.

use std::marker::PhantomData;

use blade_core::{BladeType, RegistryConfig, StackFollower};
use web_time::Instant;

use crate::kind::{EditKind, RegistryKind, ViewKind};
use crate::state::{BladeState, BladeUpdate, OpenOptions};

/// Registry of editable blades.
pub type EditBlades = BladeRegistry<EditKind>;

/// Registry of read-only blades.
pub type ViewBlades = BladeRegistry<ViewKind>;

/// What `open_blade` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenResult {
    /// A new entry was created.
    Inserted { z_index: u32 },
    /// An existing entry was restored and raised.
    Raised { z_index: u32 },
}

impl OpenResult {
    #[must_use]
    pub fn z_index(self) -> u32 {
        match self {
            Self::Inserted { z_index } | Self::Raised { z_index } => z_index,
        }
    }
}

/// A per-type blade registry.
#[derive(Debug, Clone)]
pub struct BladeRegistry<K: RegistryKind> {
    blades: Vec<BladeState>,
    z_counter: u32,
    config: RegistryConfig,
    _kind: PhantomData<K>,
}

impl<K: RegistryKind> Default for BladeRegistry<K> {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<K: RegistryKind> BladeRegistry<K> {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            blades: Vec::new(),
            z_counter: config.z_start,
            config,
            _kind: PhantomData,
        }
    }

    /// Which family this registry holds.
    #[must_use]
    pub fn blade_type(&self) -> BladeType {
        K::BLADE_TYPE
    }

    /// Current counter value (the z-index of the most recent raise).
    #[must_use]
    pub fn z_index_counter(&self) -> u32 {
        self.z_counter
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn blades(&self) -> &[BladeState] {
        &self.blades
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blades.is_empty()
    }

    /// Minimized entries in insertion order.
    pub fn minimized(&self) -> impl Iterator<Item = &BladeState> {
        self.blades.iter().filter(|b| b.is_minimized)
    }

    /// The showing entry with the highest z-index.
    #[must_use]
    pub fn front(&self) -> Option<&BladeState> {
        self.blades
            .iter()
            .filter(|b| b.is_showing())
            .max_by_key(|b| b.z_index)
    }

    #[must_use]
    pub fn get_blade(&self, id: &str) -> Option<&BladeState> {
        self.blades.iter().find(|b| b.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut BladeState> {
        self.blades.iter_mut().find(|b| b.id == id)
    }

    fn next_z(&mut self) -> u32 {
        self.z_counter = self.z_counter.saturating_add(self.config.z_step);
        self.z_counter
    }

    /// Open a blade, or restore and raise it if it is already registered.
    ///
    /// Only the options that are set are applied to an existing entry.
    /// Without an override every call hands out a strictly greater z-index.
    /// An explicit edit `z_index` override is assigned as given, on insert and
    /// on re-open alike, so re-opening with the same override keeps the same
    /// z-index. The counter still advances.
    pub fn open_blade(
        &mut self,
        id: impl Into<String>,
        name: Option<&str>,
        options: OpenOptions,
    ) -> OpenResult {
        let id = id.into();
        let counter_z = self.next_z();
        let z_index = match options.z_index {
            Some(z) if K::HONORS_Z_OVERRIDE => z,
            _ => counter_z,
        };

        if let Some(blade) = self.get_mut(&id) {
            blade.z_index = z_index;
            blade.is_minimized = false;
            blade.minimized_at = None;
            if let Some(value) = options.disable_minimize.filter(|_| K::HONORS_DISABLE_MINIMIZE) {
                blade.disable_minimize = value;
            }
            if let Some(value) = options.stack_controlled {
                blade.stack_controlled = value;
            }
            tracing::debug!(
                target: "bladestack.registry",
                kind = K::BLADE_TYPE.as_str(),
                id = %id,
                z_index,
                "blade raised"
            );
            return OpenResult::Raised { z_index };
        }

        let name = name.unwrap_or(K::DEFAULT_NAME).to_owned();
        let mut blade = BladeState::new(id, name, z_index);
        blade.disable_minimize =
            K::HONORS_DISABLE_MINIMIZE && options.disable_minimize.unwrap_or(false);
        blade.stack_controlled = options.stack_controlled.unwrap_or(false);
        tracing::debug!(
            target: "bladestack.registry",
            kind = K::BLADE_TYPE.as_str(),
            id = %blade.id,
            z_index,
            stack_controlled = blade.stack_controlled,
            "blade opened"
        );
        self.blades.push(blade);
        OpenResult::Inserted { z_index }
    }

    /// Remove an entry outright. Returns it if it existed.
    pub fn close_blade(&mut self, id: &str) -> Option<BladeState> {
        let index = self.blades.iter().position(|b| b.id == id)?;
        let blade = self.blades.remove(index);
        tracing::debug!(
            target: "bladestack.registry",
            kind = K::BLADE_TYPE.as_str(),
            id,
            dirty = blade.is_dirty,
            "blade closed"
        );
        Some(blade)
    }

    /// Minimize an entry, stamping `now`.
    ///
    /// Unconditional for known ids; `disable_minimize` only removes the
    /// panel's own minimize button. Returns `false` for unknown ids.
    pub fn minimize_blade(&mut self, id: &str, now: Instant) -> bool {
        let Some(blade) = self.get_mut(id) else {
            return false;
        };
        blade.is_minimized = true;
        blade.minimized_at = Some(now);
        tracing::debug!(
            target: "bladestack.registry",
            kind = K::BLADE_TYPE.as_str(),
            id,
            "blade minimized"
        );
        true
    }

    /// Restore an entry and bring it to the front.
    pub fn maximize_blade(&mut self, id: &str) -> bool {
        if self.get_blade(id).is_none() {
            return false;
        }
        let z_index = self.next_z();
        if let Some(blade) = self.get_mut(id) {
            blade.is_minimized = false;
            blade.minimized_at = None;
            blade.z_index = z_index;
        }
        tracing::debug!(
            target: "bladestack.registry",
            kind = K::BLADE_TYPE.as_str(),
            id,
            z_index,
            "blade restored"
        );
        true
    }

    /// Shallow-merge `update` into an entry.
    pub fn update_blade_state(&mut self, id: &str, update: BladeUpdate) -> bool {
        match self.get_mut(id) {
            Some(blade) => {
                update.apply(blade);
                true
            }
            None => false,
        }
    }

    /// Mark an entry dirty or clean. Shorthand for a one-field update.
    pub fn set_dirty(&mut self, id: &str, dirty: bool) -> bool {
        self.update_blade_state(id, BladeUpdate::new().dirty(dirty))
    }
}

impl<K: RegistryKind> StackFollower for BladeRegistry<K> {
    fn blade_type(&self) -> BladeType {
        K::BLADE_TYPE
    }

    fn minimize_stack_controlled(&mut self, now: Instant) -> usize {
        let mut changed = 0;
        for blade in self
            .blades
            .iter_mut()
            .filter(|b| b.stack_controlled && !b.is_minimized)
        {
            blade.is_minimized = true;
            blade.minimized_at = Some(now);
            changed += 1;
        }
        if changed > 0 {
            tracing::debug!(
                target: "bladestack.registry",
                kind = K::BLADE_TYPE.as_str(),
                changed,
                "stack-controlled blades minimized"
            );
        }
        changed
    }
}
