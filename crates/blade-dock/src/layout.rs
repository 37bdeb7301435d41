#![forbid(unsafe_code)]

//! Dock bar placement and hit testing.
//!
//! Bars sit on the bottom edge and flow right to left: the first item is
//! nearest the right margin. Each bar carries a restore button and, for
//! registry bars, a close button to its right.

use blade_core::{DockConfig, Rect, Viewport};

use crate::dock::{DockItem, DockTarget};

/// Square icon button size.
const BUTTON_SIZE: u32 = 32;
/// Inner horizontal padding of a bar.
const BAR_PADDING_X: i32 = 24;
/// Space between the two buttons.
const BUTTON_GAP: i32 = 8;

/// One placed bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockSlot {
    pub target: DockTarget,
    pub rect: Rect,
    pub restore_button: Rect,
    pub close_button: Option<Rect>,
}

/// What a pointer landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockHit {
    Restore(DockTarget),
    Close(DockTarget),
    /// Inside a bar but not on a button.
    Bar(DockTarget),
}

/// Placed bars for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockLayout {
    pub slots: Vec<DockSlot>,
    pub z_index: i32,
}

impl DockLayout {
    pub fn new(items: &[DockItem], config: &DockConfig, viewport: Viewport) -> Self {
        let bar_w = config.bar_width as i64;
        let stride = bar_w + config.gap as i64;
        let first_x = viewport.width as i64 - config.margin_right as i64 - bar_w;
        let y = viewport.height.saturating_sub(config.bar_height) as i32;
        let button_y = y + (config.bar_height.saturating_sub(BUTTON_SIZE) / 2) as i32;

        let slots = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let x = clamp_i32(first_x - stride * i as i64);
                let rect = Rect::new(x, y, config.bar_width, config.bar_height);
                let right_button_x = clamp_i32(rect.right() - BAR_PADDING_X as i64 - BUTTON_SIZE as i64);
                let button = |bx: i32| Rect::new(bx, button_y, BUTTON_SIZE, BUTTON_SIZE);
                let (restore_button, close_button) = if item.closable() {
                    let close = button(right_button_x);
                    let restore = button(right_button_x - BUTTON_SIZE as i32 - BUTTON_GAP);
                    (restore, Some(close))
                } else {
                    (button(right_button_x), None)
                };
                DockSlot {
                    target: item.target.clone(),
                    rect,
                    restore_button,
                    close_button,
                }
            })
            .collect();

        Self {
            slots,
            z_index: config.z_index,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The bar or button under `(x, y)`. The gaps between bars are
    /// pointer-transparent.
    #[must_use]
    pub fn hit_test(&self, x: i32, y: i32) -> Option<DockHit> {
        let slot = self.slots.iter().find(|s| s.rect.contains(x, y))?;
        let target = slot.target.clone();
        if slot.close_button.is_some_and(|b| b.contains(x, y)) {
            Some(DockHit::Close(target))
        } else if slot.restore_button.contains(x, y) {
            Some(DockHit::Restore(target))
        } else {
            Some(DockHit::Bar(target))
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
