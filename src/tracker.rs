//! Scroll-based page tracking.
//!
//! Works like an intersection observer over the page surfaces: every observed
//! surface reports once when first observed and then again each time its
//! visible fraction crosses the threshold. The reader takes the last report at
//! or above the threshold as the current page.

use crate::document::PageSurface;

/// Fraction of a surface's height that must be inside the viewport for its
/// page to become the current page.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

/// The scrolling container's visible window, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn bottom(&self) -> f64 {
        self.scroll_top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub page_num: u32,
    pub ratio: f64,
    pub is_visible: bool,
}

#[derive(Debug, Clone)]
struct Target {
    page_num: u32,
    top: f64,
    height: f64,
    /// `None` until the first report after `observe`
    visible: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PageTracker {
    threshold: f64,
    targets: Vec<Target>,
}

impl Default for PageTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

impl PageTracker {
    /// `threshold` is clamped into `(0, 1]`.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_VISIBILITY_THRESHOLD
        };
        Self {
            threshold,
            targets: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Start observing a surface. Observing the same page again replaces the
    /// old target and schedules a fresh initial report.
    pub fn observe(&mut self, surface: &PageSurface) {
        self.unobserve(surface.page_num);
        self.targets.push(Target {
            page_num: surface.page_num,
            top: surface.top,
            height: surface.height,
            visible: None,
        });
        self.targets.sort_by_key(|t| t.page_num);
    }

    pub fn unobserve(&mut self, page_num: u32) {
        self.targets.retain(|t| t.page_num != page_num);
    }

    /// Stop observing everything.
    pub fn disconnect(&mut self) {
        self.targets.clear();
    }

    pub fn observed_count(&self) -> usize {
        self.targets.len()
    }

    /// Recompute visibility for `viewport` and return the entries whose state
    /// changed, in page order.
    pub fn update(&mut self, viewport: Viewport) -> Vec<VisibilityEntry> {
        let threshold = self.threshold;
        let mut entries = Vec::new();

        for target in &mut self.targets {
            let ratio = visible_ratio(target.top, target.height, viewport);
            let is_visible = ratio >= threshold;
            if target.visible != Some(is_visible) {
                target.visible = Some(is_visible);
                entries.push(VisibilityEntry {
                    page_num: target.page_num,
                    ratio,
                    is_visible,
                });
            }
        }

        entries
    }
}

/// Pick the page a batch of entries points at. Several pages can cross the
/// threshold in one batch during a fast scroll; the last one wins.
pub fn current_page_from(entries: &[VisibilityEntry]) -> Option<u32> {
    entries
        .iter()
        .filter(|e| e.is_visible)
        .map(|e| e.page_num)
        .last()
}

/// Fraction of `[top, top + height)` inside the viewport.
pub fn visible_ratio(top: f64, height: f64, viewport: Viewport) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    let visible = (top + height).min(viewport.bottom()) - top.max(viewport.scroll_top);
    (visible.max(0.0) / height).min(1.0)
}
