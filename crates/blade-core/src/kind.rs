#![forbid(unsafe_code)]

//! Blade families and their responsive widths.

use std::fmt;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

/// The two blade families.
///
/// Each family has its own registry (and its own z-index counter) and its own
/// responsive width rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "snake_case"))]
pub enum BladeType {
    /// Read-only detail views.
    #[default]
    View,
    /// Editors; closing a dirty one needs confirmation.
    Edit,
}

impl BladeType {
    /// Stable lowercase name, used in logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for BladeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One breakpoint of a [`WidthRule`]: from `min_viewport` upwards the blade
/// takes `ratio` of the viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
pub struct WidthStep {
    pub min_viewport: u32,
    pub ratio: f32,
}

impl WidthStep {
    pub const fn new(min_viewport: u32, ratio: f32) -> Self {
        Self {
            min_viewport,
            ratio,
        }
    }
}

/// Responsive width rule, steps sorted by `min_viewport`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
pub struct WidthRule {
    pub steps: Vec<WidthStep>,
}

impl WidthRule {
    pub fn new(steps: Vec<WidthStep>) -> Self {
        Self { steps }
    }

    /// Full width until 1280, then 90%, then 80% from 1536.
    pub fn view_default() -> Self {
        Self::new(vec![
            WidthStep::new(0, 1.0),
            WidthStep::new(1280, 0.9),
            WidthStep::new(1536, 0.8),
        ])
    }

    /// Full width on small screens, narrowing to 60% from 1536.
    pub fn edit_default() -> Self {
        Self::new(vec![
            WidthStep::new(0, 1.0),
            WidthStep::new(768, 0.9),
            WidthStep::new(1024, 0.8),
            WidthStep::new(1280, 0.7),
            WidthStep::new(1536, 0.6),
        ])
    }

    /// Width ratio for a viewport of `viewport_width`. Falls back to `1.0`
    /// when no step applies.
    #[must_use]
    pub fn ratio_for(&self, viewport_width: u32) -> f32 {
        self.steps
            .iter()
            .filter(|s| s.min_viewport <= viewport_width)
            .max_by_key(|s| s.min_viewport)
            .map_or(1.0, |s| s.ratio.clamp(0.0, 1.0))
    }

    /// Absolute width in logical pixels for a viewport of `viewport_width`.
    #[must_use]
    pub fn width_for(&self, viewport_width: u32) -> u32 {
        let width = (viewport_width as f32 * self.ratio_for(viewport_width)).round();
        (width as u32).min(viewport_width)
    }
}
