#![forbid(unsafe_code)]

//! Registry family markers.

use blade_core::BladeType;

/// Compile-time description of a registry family.
pub trait RegistryKind: 'static {
    /// The family this registry manages.
    const BLADE_TYPE: BladeType;
    /// Name used when `open_blade` is called without one.
    const DEFAULT_NAME: &'static str;
    /// Whether `OpenOptions::z_index` overrides the counter.
    const HONORS_Z_OVERRIDE: bool;
    /// Whether `disable_minimize` is tracked for the panel's minimize button.
    const HONORS_DISABLE_MINIMIZE: bool;
}

/// Editors: honour z-index overrides and `disable_minimize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditKind;

impl RegistryKind for EditKind {
    const BLADE_TYPE: BladeType = BladeType::Edit;
    const DEFAULT_NAME: &'static str = "Edit Report";
    const HONORS_Z_OVERRIDE: bool = true;
    const HONORS_DISABLE_MINIMIZE: bool = true;
}

/// Read-only views: always use the counter and can always be minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewKind;

impl RegistryKind for ViewKind {
    const BLADE_TYPE: BladeType = BladeType::View;
    const DEFAULT_NAME: &'static str = "View Report";
    const HONORS_Z_OVERRIDE: bool = false;
    const HONORS_DISABLE_MINIMIZE: bool = false;
}
