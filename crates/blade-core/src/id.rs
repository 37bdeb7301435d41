#![forbid(unsafe_code)]

//! Stack entry identifiers.

use std::fmt;

/// Identifier of a mounted stack entry.
///
/// Ids are handed out by a [`BladeIdAllocator`] and are strictly increasing for
/// the lifetime of the allocator, so two blades opened within the same clock
/// tick never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BladeId(u64);

impl BladeId {
    /// Wrap a raw id. Intended for tests and trace replay.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BladeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blade#{}", self.0)
    }
}

/// Monotonic id source. Starts at 1.
#[derive(Debug, Clone)]
pub struct BladeIdAllocator {
    next: u64,
}

impl Default for BladeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BladeIdAllocator {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> BladeId {
        let id = BladeId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Peek at the id the next `allocate` call would return.
    #[must_use]
    pub const fn peek(&self) -> BladeId {
        BladeId(self.next)
    }
}
