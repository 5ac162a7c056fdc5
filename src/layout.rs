//! Annotation positioning: where the card goes and where its connector line runs.
//!
//! Inputs are screen-space (viewport-relative). The output is in document
//! space (screen plus scroll offset) because the overlay is absolutely
//! positioned in the page. Everything here is a pure function of its
//! arguments; layouts are rebuilt every frame, never patched.

use serde::Serialize;

use crate::geom::{Geometry, Point, Rect, Size};
use crate::marker::{Marker, Side};

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

/// Card rectangle plus line endpoints before animation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub side: Side,
    /// Card rect in document coordinates.
    pub card: Rect,
    /// Marker anchor in document coordinates.
    pub line_start: Point,
    /// Midpoint of the card edge facing the marker, in document coordinates.
    pub line_target: Point,
}

/// The connector line as drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineLayout {
    pub start: Point,
    /// Where the line ends at `progress == 1`.
    pub target: Point,
    /// Where the line ends this frame.
    pub end: Point,
    pub progress: f64,
}

/// Everything the presentation layer needs to paint the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnotationLayout {
    pub side: Side,
    pub card: Rect,
    pub line: LineLayout,
}

impl Placement {
    /// Apply animation progress to the connector line.
    #[must_use]
    pub fn with_progress(&self, progress: f64) -> AnnotationLayout {
        let progress = progress.clamp(0.0, 1.0);
        AnnotationLayout {
            side: self.side,
            card: self.card,
            line: LineLayout {
                start: self.line_start,
                target: self.line_target,
                end: self.line_start.lerp(self.line_target, progress),
                progress,
            },
        }
    }
}

/// Screen-space anchor for a marker.
///
/// Resolves the marker's percentages against the map image rect. Falls back
/// to the center of the marker's own element when the map is not measured.
#[must_use]
pub fn anchor_for(marker: &Marker, geometry: &Geometry) -> Option<Point> {
    if let Some(map) = geometry.map.filter(Rect::is_measured) {
        return Some(map.point_at_percent(marker.x_pct, marker.y_pct));
    }
    geometry.marker_rect(&marker.id).map(|r| r.center())
}

/// Places a fixed-size card beside an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationPositioner {
    card: Size,
    gap: f64,
}

impl AnnotationPositioner {
    #[must_use]
    pub fn new(card: Size, gap: f64) -> Self {
        Self { card, gap }
    }

    /// Compute the card rect and line endpoints.
    ///
    /// Returns `None` for a non-finite anchor or scroll offset.
    #[must_use]
    pub fn place(&self, anchor: Point, side: Side, viewport: Size, scroll: Point) -> Option<Placement> {
        if !anchor.is_finite() || !scroll.is_finite() {
            return None;
        }
        let Size { width, height } = self.card;

        let x = match side {
            Side::Left => anchor.x - self.gap - width,
            Side::Right => anchor.x + self.gap,
        };
        let y = clamp_top(anchor.y - height * 0.5, height, viewport.height);

        let card = Rect::new(x, y, width, height);
        let edge_x = match side {
            Side::Left => card.right(),
            Side::Right => card.left(),
        };
        let target = Point::new(edge_x, card.center().y);

        Some(Placement {
            side,
            card: Rect::new(card.x + scroll.x, card.y + scroll.y, width, height),
            line_start: anchor.offset(scroll),
            line_target: target.offset(scroll),
        })
    }
}

/// Keep the card's top on screen. A card taller than the viewport pins to the top.
fn clamp_top(y: f64, height: f64, viewport_height: f64) -> f64 {
    let max_top = viewport_height - height;
    if !max_top.is_finite() {
        return y.max(0.0);
    }
    if max_top <= 0.0 {
        return 0.0;
    }
    y.clamp(0.0, max_top)
}
