#![forbid(unsafe_code)]

//! Configuration for the blade stack, registries, layout, and dock.
//!
//! Captures every tunable constant as a single [`BladeConfig`] that can be
//! loaded from TOML or JSON at startup (feature `config-file`).
//!
//! # Loading
//!
//! ```toml
//! # bladestack.toml
//! [stack]
//! max_depth = 5
//! progress_delay_ms = 2000
//!
//! [registry]
//! z_start = 100
//! ```
//!
//! ```rust,ignore
//! let config = BladeConfig::from_toml_file("bladestack.toml")?;
//! ```
//!
//! # Defaults
//!
//! `BladeConfig::default()` reproduces the dashboard's behaviour: five blades,
//! a 2 s progress delay, z-indices from 1000 in steps of 10, 150 px fan-out
//! capped at three steps, and registry counters from 100 in steps of 2.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::kind::{BladeType, WidthRule};

// ---------------------------------------------------------------------------
// Top-level BladeConfig
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct BladeConfig {
    /// Stack engine limits, timers, and z-ordering.
    pub stack: StackConfig,
    /// Per-type registry counters.
    pub registry: RegistryConfig,
    /// Responsive blade widths.
    pub layout: LayoutConfig,
    /// Minimized dock geometry.
    pub dock: DockConfig,
}

impl BladeConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.into_validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.into_validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a pretty TOML string.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let s = &self.stack;

        if s.max_depth == 0 {
            errors.push("stack.max_depth must be > 0".into());
        }
        if s.z_step <= 0 {
            errors.push(format!("stack.z_step must be > 0, got {}", s.z_step));
        }
        if s.offset_step < 0 {
            errors.push(format!("stack.offset_step must be >= 0, got {}", s.offset_step));
        }
        if s.ready_timeout_ms == Some(0) {
            errors.push("stack.ready_timeout_ms must be > 0 when set (use None to disable)".into());
        }
        for (name, value) in [
            ("stack.overlay_base_opacity", s.overlay_base_opacity),
            ("stack.overlay_step", s.overlay_step),
            ("stack.overlay_max", s.overlay_max),
            ("stack.loading_veil_opacity", s.loading_veil_opacity),
            ("stack.standalone_overlay_opacity", s.standalone_overlay_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if s.overlay_scale <= 0.0 {
            errors.push(format!("stack.overlay_scale must be > 0, got {}", s.overlay_scale));
        }

        if self.registry.z_step == 0 {
            errors.push("registry.z_step must be > 0".into());
        }

        for (name, rule) in [("layout.view", &self.layout.view), ("layout.edit", &self.layout.edit)] {
            for step in &rule.steps {
                if !(step.ratio > 0.0 && step.ratio <= 1.0) {
                    errors.push(format!(
                        "{name} ratio at {} must be in (0, 1], got {}",
                        step.min_viewport, step.ratio
                    ));
                }
            }
        }

        if self.dock.bar_width == 0 || self.dock.bar_height == 0 {
            errors.push("dock bar dimensions must be > 0".into());
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// Stack engine parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct StackConfig {
    /// Maximum number of entries (open + reserved).
    pub max_depth: usize,
    /// Delay before the indeterminate progress bar appears.
    pub progress_delay_ms: u64,
    /// Entries that never signal ready are dropped after this long. `None`
    /// keeps them hidden forever; config files spell that `0`.
    #[cfg_attr(feature = "config-file", serde(with = "timeout_millis"))]
    pub ready_timeout_ms: Option<u64>,
    /// z-index of the first ready blade's layer.
    pub z_base: i32,
    /// z-index distance between consecutive ready blades.
    pub z_step: i32,
    /// Horizontal fan-out per depth step.
    pub offset_step: i32,
    /// Depth beyond which blades stop fanning out.
    pub max_offset_steps: u32,
    pub overlay_base_opacity: f32,
    pub overlay_step: f32,
    pub overlay_max: f32,
    pub overlay_scale: f32,
    pub loading_veil_opacity: f32,
    /// Progress bar sits this far above the active blade.
    pub progress_z_lift: i32,
    /// Loading veil sits this far above the active blade.
    pub veil_z_lift: i32,
    /// Standalone (non-stack) blades sit this far above the active blade.
    pub standalone_z_lift: i32,
    pub standalone_overlay_opacity: f32,
}

/// `ready_timeout_ms` in files: `0` (or JSON `null`) disables the timeout.
#[cfg(feature = "config-file")]
mod timeout_millis {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.filter(|&ms| ms > 0))
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            progress_delay_ms: 2000,
            ready_timeout_ms: Some(30_000),
            z_base: 1000,
            z_step: 10,
            offset_step: 150,
            max_offset_steps: 3,
            overlay_base_opacity: 0.2,
            overlay_step: 0.2,
            overlay_max: 0.6,
            overlay_scale: 1.2,
            loading_veil_opacity: 0.4,
            progress_z_lift: 30,
            veil_z_lift: 20,
            standalone_z_lift: 5,
            standalone_overlay_opacity: 0.48,
        }
    }
}

impl StackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn progress_delay(mut self, delay: Duration) -> Self {
        self.progress_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout_ms = timeout.map(|d| d.as_millis() as u64);
        self
    }

    #[must_use]
    pub fn progress_delay_duration(&self) -> Duration {
        Duration::from_millis(self.progress_delay_ms)
    }

    #[must_use]
    pub fn ready_timeout_duration(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }

    /// Overlay opacity for a ready blade `depth` steps below the top.
    #[must_use]
    pub fn overlay_opacity(&self, depth: usize) -> f32 {
        let base = (self.overlay_base_opacity + depth as f32 * self.overlay_step).min(self.overlay_max);
        (base * self.overlay_scale).min(1.0)
    }

    /// Horizontal offset for a ready blade `depth` steps below the top.
    #[must_use]
    pub fn fan_offset(&self, depth: usize) -> i32 {
        let steps = depth.min(self.max_offset_steps as usize) as i32;
        -self.offset_step.saturating_mul(steps)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Per-type registry counter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct RegistryConfig {
    /// Initial counter value (the first blade gets `z_start + z_step`).
    pub z_start: u32,
    /// Counter increment; even so each blade keeps a slot for its backdrop.
    pub z_step: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            z_start: 100,
            z_step: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Responsive widths per blade family.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct LayoutConfig {
    pub view: WidthRule,
    pub edit: WidthRule,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            view: WidthRule::view_default(),
            edit: WidthRule::edit_default(),
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn rule(&self, blade_type: BladeType) -> &WidthRule {
        match blade_type {
            BladeType::View => &self.view,
            BladeType::Edit => &self.edit,
        }
    }
}

// ---------------------------------------------------------------------------
// Dock
// ---------------------------------------------------------------------------

/// Minimized dock geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct DockConfig {
    pub bar_width: u32,
    pub bar_height: u32,
    /// Horizontal gap between bars.
    pub gap: u32,
    /// Distance of the first bar from the right edge.
    pub margin_right: u32,
    /// Dock layer z-index.
    pub z_index: i32,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            bar_width: 288,
            bar_height: 64,
            gap: 12,
            margin_right: 16,
            z_index: 40,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating a [`BladeConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config-file")]
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::TomlSerialize(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
