#![forbid(unsafe_code)]

//! Registry entry state, open options, and partial updates.

use web_time::Instant;

/// One registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BladeState {
    /// Business-entity id (e.g. a report id).
    pub id: String,
    /// Display label for the minimized bar.
    pub name: String,
    pub is_minimized: bool,
    /// Unsaved changes; closing from the dock asks for confirmation.
    pub is_dirty: bool,
    pub z_index: u32,
    /// When the blade was last minimized. Cleared on restore.
    pub minimized_at: Option<Instant>,
    pub disable_minimize: bool,
    /// Minimize/restore follow the blade stack.
    pub stack_controlled: bool,
}

impl BladeState {
    pub(crate) fn new(id: String, name: String, z_index: u32) -> Self {
        Self {
            id,
            name,
            is_minimized: false,
            is_dirty: false,
            z_index,
            minimized_at: None,
            disable_minimize: false,
            stack_controlled: false,
        }
    }

    /// z-index reserved for this blade's backdrop.
    #[must_use]
    pub fn backdrop_z_index(&self) -> u32 {
        self.z_index.saturating_sub(1)
    }

    /// True if the blade is open and showing (not minimized).
    #[must_use]
    pub fn is_showing(&self) -> bool {
        !self.is_minimized
    }
}

/// Options for `open_blade`. Unset fields leave existing values alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    pub disable_minimize: Option<bool>,
    pub stack_controlled: Option<bool>,
    /// Explicit z-index (edit registry only).
    pub z_index: Option<u32>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable_minimize(mut self, value: bool) -> Self {
        self.disable_minimize = Some(value);
        self
    }

    pub fn stack_controlled(mut self, value: bool) -> Self {
        self.stack_controlled = Some(value);
        self
    }

    pub fn z_index(mut self, value: u32) -> Self {
        self.z_index = Some(value);
        self
    }
}

/// Shallow partial update for `update_blade_state`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BladeUpdate {
    pub name: Option<String>,
    pub is_dirty: Option<bool>,
    pub is_minimized: Option<bool>,
    pub minimized_at: Option<Option<Instant>>,
    pub z_index: Option<u32>,
    pub disable_minimize: Option<bool>,
    pub stack_controlled: Option<bool>,
}

impl BladeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn dirty(mut self, dirty: bool) -> Self {
        self.is_dirty = Some(dirty);
        self
    }

    pub fn minimized(mut self, minimized: bool) -> Self {
        self.is_minimized = Some(minimized);
        self
    }

    pub fn minimized_at(mut self, at: Option<Instant>) -> Self {
        self.minimized_at = Some(at);
        self
    }

    pub fn z_index(mut self, z: u32) -> Self {
        self.z_index = Some(z);
        self
    }

    pub fn disable_minimize(mut self, value: bool) -> Self {
        self.disable_minimize = Some(value);
        self
    }

    pub fn stack_controlled(mut self, value: bool) -> Self {
        self.stack_controlled = Some(value);
        self
    }

    /// True if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(self, blade: &mut BladeState) {
        if let Some(name) = self.name {
            blade.name = name;
        }
        if let Some(dirty) = self.is_dirty {
            blade.is_dirty = dirty;
        }
        if let Some(minimized) = self.is_minimized {
            blade.is_minimized = minimized;
        }
        if let Some(at) = self.minimized_at {
            blade.minimized_at = at;
        }
        if let Some(z) = self.z_index {
            blade.z_index = z;
        }
        if let Some(value) = self.disable_minimize {
            blade.disable_minimize = value;
        }
        if let Some(value) = self.stack_controlled {
            blade.stack_controlled = value;
        }
    }
}
