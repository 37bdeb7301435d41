#![forbid(unsafe_code)]

//! Scenario files.
//!
//! A scenario is a workspace configuration plus a list of steps, written in
//! TOML or JSON. Every step carries an `op` tag:
//!
//! ```toml
//! name = "open and escape"
//!
//! [[steps]]
//! op = "open"
//! label = "Reports"
//!
//! [[steps]]
//! op = "escape"
//!
//! [[steps]]
//! op = "expect"
//! stack_count = 0
//! ```

use std::path::Path;

use bladestack::{BladeConfig, BladeType, DockTarget};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// A parsed scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: BladeConfig,
    #[serde(default)]
    pub viewport: Option<ScenarioViewport>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioViewport {
    pub width: u32,
    pub height: u32,
}

/// How an `open` step's loader settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderMode {
    /// Resolves at once.
    #[default]
    Ready,
    /// Waits for a `resolve` or `reject` step naming its handle.
    Deferred,
    /// Rejects at once.
    Fail,
}

/// When a mounted panel reports ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    /// Inside `mount`.
    #[default]
    Immediate,
    /// On a `ready` step naming its handle.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryAction {
    Open,
    Minimize,
    Maximize,
    Close,
    Dirty,
    Clean,
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Open {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        loader: LoaderMode,
        #[serde(default)]
        signal: SignalMode,
        #[serde(default)]
        blade_type: BladeType,
        /// Names the pending load or held signal for later steps.
        #[serde(default)]
        handle: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Resolve {
        handle: String,
    },
    Reject {
        handle: String,
        #[serde(default)]
        message: Option<String>,
    },
    Ready {
        handle: String,
    },
    Escape,
    Click {
        x: i32,
        y: i32,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Advance {
        ms: u64,
    },
    Tick,
    CloseTop,
    MinimizeStack,
    MaximizeStack,
    /// Host unmount: cancel in-flight opens.
    Unmount,
    Registry {
        kind: BladeType,
        action: RegistryAction,
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        stack_controlled: Option<bool>,
        #[serde(default)]
        disable_minimize: Option<bool>,
        #[serde(default)]
        z_index: Option<u32>,
    },
    /// A panel's minimize button.
    MinimizeEntity {
        kind: BladeType,
        id: String,
    },
    /// An edit panel's "discard changes".
    ForceCloseEdit {
        id: String,
    },
    DockRestore {
        target: String,
    },
    DockClose {
        target: String,
    },
    Confirm,
    Cancel,
    Expect(Expectation),
}

impl Step {
    /// The `op` tag, for snapshots.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Resolve { .. } => "resolve",
            Self::Reject { .. } => "reject",
            Self::Ready { .. } => "ready",
            Self::Escape => "escape",
            Self::Click { .. } => "click",
            Self::Resize { .. } => "resize",
            Self::Advance { .. } => "advance",
            Self::Tick => "tick",
            Self::CloseTop => "close_top",
            Self::MinimizeStack => "minimize_stack",
            Self::MaximizeStack => "maximize_stack",
            Self::Unmount => "unmount",
            Self::Registry { .. } => "registry",
            Self::MinimizeEntity { .. } => "minimize_entity",
            Self::ForceCloseEdit { .. } => "force_close_edit",
            Self::DockRestore { .. } => "dock_restore",
            Self::DockClose { .. } => "dock_close",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Expect(_) => "expect",
        }
    }
}

/// Assertions against the state after the previous step. Unset fields are
/// not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectation {
    pub stack_count: Option<usize>,
    pub pending: Option<usize>,
    pub ready_count: Option<usize>,
    pub minimized: Option<bool>,
    pub loading: Option<bool>,
    pub progress_visible: Option<bool>,
    pub label: Option<String>,
    pub active_z_index: Option<i32>,
    /// Fan-out offsets of visible blades, bottom to top.
    pub offsets: Option<Vec<i32>>,
    /// Dock bars in display order (`stack`, `edit:<id>`, `view:<id>`).
    pub dock: Option<Vec<String>>,
    pub dialog_open: Option<bool>,
    /// Kind of the most recent open outcome.
    pub outcome: Option<String>,
    /// Ids of minimized edit blades.
    pub edit_minimized: Option<Vec<String>>,
    /// Ids of minimized view blades.
    pub view_minimized: Option<Vec<String>>,
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load by extension: `.json` is JSON, anything else TOML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HarnessError::MissingPath {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

/// Parse `stack`, `edit:<id>` or `view:<id>`.
pub fn parse_target(raw: &str) -> Option<DockTarget> {
    if raw == "stack" {
        return Some(DockTarget::Stack);
    }
    let (kind, id) = raw.split_once(':')?;
    if id.is_empty() {
        return None;
    }
    match kind {
        "edit" => Some(DockTarget::Edit(id.to_string())),
        "view" => Some(DockTarget::View(id.to_string())),
        _ => None,
    }
}

/// Inverse of [`parse_target`].
#[must_use]
pub fn format_target(target: &DockTarget) -> String {
    match target {
        DockTarget::Stack => "stack".to_string(),
        DockTarget::Edit(id) => format!("edit:{id}"),
        DockTarget::View(id) => format!("view:{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_steps_are_tagged_by_op() {
        let scenario = Scenario::from_toml_str(
            r#"
            name = "basic"

            [[steps]]
            op = "open"
            label = "Reports"
            loader = "deferred"
            handle = "r"

            [[steps]]
            op = "resolve"
            handle = "r"

            [[steps]]
            op = "expect"
            stack_count = 1
            "#,
        );
        let scenario = scenario.unwrap();
        assert_eq!(scenario.name, "basic");
        assert_eq!(scenario.steps.len(), 3);
        assert!(matches!(
            &scenario.steps[0],
            Step::Open { loader: LoaderMode::Deferred, handle: Some(h), .. } if h == "r"
        ));
        assert_eq!(scenario.steps[2].op(), "expect");
        assert_eq!(scenario.config, BladeConfig::default());
    }

    #[test]
    fn json_scenario_with_config() {
        let scenario = Scenario::from_json_str(
            r#"{
                "config": { "stack": { "max_depth": 2 } },
                "steps": [
                    { "op": "registry", "kind": "edit", "action": "open", "id": "e1" },
                    { "op": "expect", "edit_minimized": [] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.config.stack.max_depth, 2);
        assert!(matches!(
            &scenario.steps[0],
            Step::Registry { kind: BladeType::Edit, action: RegistryAction::Open, .. }
        ));
    }

    #[test]
    fn unknown_expectation_field_is_rejected() {
        let err = Scenario::from_json_str(r#"{ "steps": [ { "op": "expect", "stack_cnt": 1 } ] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn targets_parse_and_format() {
        for raw in ["stack", "edit:e1", "view:r:7"] {
            let target = parse_target(raw).unwrap();
            assert_eq!(format_target(&target), raw);
        }
        assert_eq!(parse_target("edit:"), None);
        assert_eq!(parse_target("panel:1"), None);
    }
}
