#![forbid(unsafe_code)]

//! Layout plan for the blade stack.
//!
//! A [`StackLayout`] is a pure description of what a front-end should draw:
//! one [`Placement`] per entry in open order, plus the optional progress bar
//! and loading veil layers. Positions are logical pixels; z-indices follow the
//! stack configuration.
//!
//! # Invariants
//!
//! 1. Ready blades get strictly increasing z-indices in open order.
//! 2. Each ready blade's overlay sits exactly one z-index below it.
//! 3. Only the top-most ready blade's overlay is clickable; lower overlays are
//!    pointer-transparent.
//! 4. A minimized stack produces an empty plan.

use blade_core::{BladeId, BladeType, LayoutConfig, Rect, StackConfig, Viewport};

/// Height of the indeterminate progress bar.
const PROGRESS_BAR_HEIGHT: u32 = 4;

/// A full-viewport (or full-width) layer: progress bar or loading veil.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub rect: Rect,
    pub z_index: i32,
    pub opacity: f32,
}

/// The darkening overlay behind a ready blade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub rect: Rect,
    pub z_index: i32,
    pub opacity: f32,
    /// Clicks on a clickable overlay close the top blade.
    pub clickable: bool,
}

/// A ready blade on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleBlade {
    pub id: BladeId,
    pub blade_type: BladeType,
    pub rect: Rect,
    /// Horizontal fan-out applied to `rect` (zero or negative).
    pub offset_x: i32,
    pub z_index: i32,
    /// Position among ready blades, 0 = oldest.
    pub ready_index: usize,
    /// Distance from the top-most ready blade, 0 = top.
    pub depth: usize,
    pub overlay: Overlay,
}

impl VisibleBlade {
    #[must_use]
    pub fn is_top(&self) -> bool {
        self.depth == 0
    }
}

/// Where one stack entry goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Mounted but off-screen while its data loads.
    Hidden(BladeId),
    Visible(VisibleBlade),
}

impl Placement {
    #[must_use]
    pub fn id(&self) -> BladeId {
        match self {
            Self::Hidden(id) => *id,
            Self::Visible(blade) => blade.id,
        }
    }

    #[must_use]
    pub fn as_visible(&self) -> Option<&VisibleBlade> {
        match self {
            Self::Hidden(_) => None,
            Self::Visible(blade) => Some(blade),
        }
    }
}

/// Result of [`StackLayout::hit_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackHit {
    /// Inside a visible blade.
    Panel(BladeId),
    /// On the top blade's clickable overlay.
    Overlay(BladeId),
    /// On the loading veil, which swallows clicks.
    LoadingVeil,
}

/// The full plan for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayout {
    pub viewport: Viewport,
    /// One entry per stack entry, in open order.
    pub placements: Vec<Placement>,
    pub progress: Option<Layer>,
    pub veil: Option<Layer>,
    pub active_z_index: i32,
}

/// The slice of an entry the planner needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntrySummary {
    pub id: BladeId,
    pub blade_type: BladeType,
    pub ready: bool,
}

/// Flags the planner needs from the engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlanState {
    pub minimized: bool,
    pub loading: bool,
    pub progress_visible: bool,
    pub active_z_index: i32,
}

impl StackLayout {
    /// A plan with nothing on screen.
    #[must_use]
    pub fn empty(viewport: Viewport, active_z_index: i32) -> Self {
        Self {
            viewport,
            placements: Vec::new(),
            progress: None,
            veil: None,
            active_z_index,
        }
    }

    pub(crate) fn plan(
        config: &StackConfig,
        widths: &LayoutConfig,
        viewport: Viewport,
        entries: &[EntrySummary],
        state: PlanState,
    ) -> Self {
        if state.minimized {
            return Self::empty(viewport, state.active_z_index);
        }

        let ready_count = entries.iter().filter(|e| e.ready).count();
        let mut ready_index = 0usize;
        let mut placements = Vec::with_capacity(entries.len());

        for entry in entries {
            if !entry.ready {
                placements.push(Placement::Hidden(entry.id));
                continue;
            }
            let depth = ready_count - 1 - ready_index;
            let offset_x = config.fan_offset(depth);
            let z_index = config
                .z_base
                .saturating_add(config.z_step.saturating_mul(ready_index as i32))
                .saturating_add(1);
            let width = widths.rule(entry.blade_type).width_for(viewport.width);
            placements.push(Placement::Visible(VisibleBlade {
                id: entry.id,
                blade_type: entry.blade_type,
                rect: viewport.right_anchored(width).shifted_x(offset_x),
                offset_x,
                z_index,
                ready_index,
                depth,
                overlay: Overlay {
                    rect: viewport.bounds(),
                    z_index: z_index - 1,
                    opacity: config.overlay_opacity(depth),
                    clickable: depth == 0,
                },
            }));
            ready_index += 1;
        }

        let progress = state.progress_visible.then(|| Layer {
            rect: Rect::new(0, 0, viewport.width, PROGRESS_BAR_HEIGHT),
            z_index: state.active_z_index.saturating_add(config.progress_z_lift),
            opacity: 1.0,
        });
        let veil = state.loading.then(|| Layer {
            rect: viewport.bounds(),
            z_index: state.active_z_index.saturating_add(config.veil_z_lift),
            opacity: config.loading_veil_opacity,
        });

        Self {
            viewport,
            placements,
            progress,
            veil,
            active_z_index: state.active_z_index,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty() && self.progress.is_none() && self.veil.is_none()
    }

    /// Visible blades in open order.
    pub fn visible(&self) -> impl Iterator<Item = &VisibleBlade> {
        self.placements.iter().filter_map(Placement::as_visible)
    }

    /// The top-most ready blade.
    #[must_use]
    pub fn top(&self) -> Option<&VisibleBlade> {
        self.visible().last()
    }

    #[must_use]
    pub fn placement(&self, id: BladeId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id() == id)
    }

    /// What a pointer at `(x, y)` lands on, highest z-index first.
    ///
    /// Non-clickable overlays are pointer-transparent and never hit.
    #[must_use]
    pub fn hit_test(&self, x: i32, y: i32) -> Option<StackHit> {
        let mut best: Option<(i32, StackHit)> = None;
        let mut consider = |z: i32, rect: &Rect, hit: StackHit| {
            if rect.contains(x, y) && best.is_none_or(|(bz, _)| z > bz) {
                best = Some((z, hit));
            }
        };

        if let Some(veil) = &self.veil {
            consider(veil.z_index, &veil.rect, StackHit::LoadingVeil);
        }
        for blade in self.visible() {
            consider(blade.z_index, &blade.rect, StackHit::Panel(blade.id));
            if blade.overlay.clickable {
                consider(blade.overlay.z_index, &blade.overlay.rect, StackHit::Overlay(blade.id));
            }
        }
        best.map(|(_, hit)| hit)
    }
}

/// z-index and overlay for a blade drawn outside the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandaloneLayer {
    pub z_index: i32,
    pub overlay_z_index: i32,
    pub overlay_opacity: f32,
}
