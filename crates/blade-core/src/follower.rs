#![forbid(unsafe_code)]

//! The seam between the stack engine and the per-type registries.

use web_time::Instant;

use crate::kind::BladeType;

/// A registry whose stack-controlled blades follow the blade stack.
///
/// When the stack is restored by a new open, blades marked `stack_controlled`
/// that are still showing on their own are minimized so the two views do not
/// fight over the screen.
pub trait StackFollower {
    /// Which family this follower manages.
    fn blade_type(&self) -> BladeType;

    /// Minimize every stack-controlled blade that is not already minimized,
    /// stamping `now` as the minimize time. Returns how many changed.
    fn minimize_stack_controlled(&mut self, now: Instant) -> usize;
}
