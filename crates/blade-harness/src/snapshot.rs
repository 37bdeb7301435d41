#![forbid(unsafe_code)]

//! Per-step state snapshots and the JSONL trace built from them.

use bladestack::{BladeState, Workspace};
use serde::{Deserialize, Serialize};

use crate::scenario::format_target;

/// A visible blade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BladeSnapshot {
    pub id: u64,
    pub blade_type: String,
    pub offset_x: i32,
    pub z_index: i32,
    pub overlay_opacity: f32,
    pub overlay_clickable: bool,
}

/// A registry blade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub id: String,
    pub z_index: u32,
    pub minimized: bool,
    pub dirty: bool,
    pub stack_controlled: bool,
}

impl From<&BladeState> for RegistrySnapshot {
    fn from(state: &BladeState) -> Self {
        Self {
            id: state.id.clone(),
            z_index: state.z_index,
            minimized: state.is_minimized,
            dirty: state.is_dirty,
            stack_controlled: state.stack_controlled,
        }
    }
}

/// Workspace state after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: usize,
    pub op: String,
    pub elapsed_ms: u64,
    pub stack_count: usize,
    pub pending: usize,
    pub ready_count: usize,
    pub minimized: bool,
    pub loading: bool,
    pub progress_visible: bool,
    pub label: String,
    pub active_z_index: i32,
    pub visible: Vec<BladeSnapshot>,
    pub dock: Vec<String>,
    pub dialog_open: bool,
    /// Outcome of an open that settled during this step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// What `handle_event` did, if this step sent input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<String>,
    pub edit: Vec<RegistrySnapshot>,
    pub view: Vec<RegistrySnapshot>,
}

impl Snapshot {
    pub(crate) fn capture(ws: &Workspace, step: usize, op: &str, elapsed_ms: u64) -> Self {
        let stack = ws.stack();
        let layout = ws.layout();
        let registry = |blades: Option<&[BladeState]>| {
            blades
                .unwrap_or_default()
                .iter()
                .map(RegistrySnapshot::from)
                .collect::<Vec<_>>()
        };
        Self {
            step,
            op: op.to_string(),
            elapsed_ms,
            stack_count: stack.stack_count(),
            pending: stack.pending_count(),
            ready_count: stack.ready_count(),
            minimized: stack.is_stack_minimized(),
            loading: stack.is_loading(),
            progress_visible: stack.is_progress_visible(),
            label: stack.stack_label().to_string(),
            active_z_index: stack.active_blade_z_index(),
            visible: layout
                .visible()
                .map(|b| BladeSnapshot {
                    id: b.id.get(),
                    blade_type: b.blade_type.as_str().to_string(),
                    offset_x: b.offset_x,
                    z_index: b.z_index,
                    overlay_opacity: b.overlay.opacity,
                    overlay_clickable: b.overlay.clickable,
                })
                .collect(),
            dock: ws
                .dock_items()
                .iter()
                .map(|item| format_target(&item.target))
                .collect(),
            dialog_open: ws.dock().dialog().is_open(),
            outcome: None,
            action: None,
            events: Vec::new(),
            edit: registry(ws.maybe_edit_blades().map(|r| r.blades())),
            view: registry(ws.maybe_view_blades().map(|r| r.blades())),
        }
    }

    /// Ids of minimized blades in one registry snapshot.
    #[must_use]
    pub fn minimized_ids(blades: &[RegistrySnapshot]) -> Vec<String> {
        blades
            .iter()
            .filter(|b| b.minimized)
            .map(|b| b.id.clone())
            .collect()
    }
}

/// The snapshots of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub scenario: String,
    pub snapshots: Vec<Snapshot>,
}

impl Trace {
    /// One JSON object per line, newline-terminated.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for snapshot in &self.snapshots {
            out.push_str(&serde_json::to_string(snapshot)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// `blake3:<hex>` over the JSONL trace.
    pub fn digest(&self) -> serde_json::Result<String> {
        let jsonl = self.to_jsonl()?;
        Ok(format!("blake3:{}", blake3::hash(jsonl.as_bytes()).to_hex()))
    }

    #[must_use]
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}
