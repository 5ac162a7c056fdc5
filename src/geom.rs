//! Screen-space geometry primitives shared by the tracker and positioner.
//!
//! All values are CSS pixels. Rectangles are viewport-relative (the shape
//! `getBoundingClientRect` reports) unless a function says otherwise.

use std::collections::HashMap;

use serde::Serialize;

use crate::marker::MarkerId;

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

/// A point in screen or document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `offset`.
    #[must_use]
    pub fn offset(self, offset: Point) -> Self {
        Self { x: self.x + offset.x, y: self.y + offset.y }
    }

    /// Linear interpolation from `self` toward `to`. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, to: Point, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether the rect has a real laid-out box. Elements that are not yet
    /// rendered report a zero-sized rect.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Whether any part of the rect lies within `[0, viewport_height)` vertically.
    #[must_use]
    pub fn intersects_vertically(&self, viewport_height: f64) -> bool {
        self.is_measured() && self.bottom() > 0.0 && self.top() < viewport_height
    }

    /// The point at `(x_pct, y_pct)` percent of this rect, measured from the top-left.
    #[must_use]
    pub fn point_at_percent(&self, x_pct: f64, y_pct: f64) -> Point {
        Point::new(self.x + self.width * x_pct / 100.0, self.y + self.height * y_pct / 100.0)
    }
}

/// One frame's worth of measured layout, supplied by the host.
///
/// Marker rects that are missing or zero-sized are treated as "not laid out".
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Viewport size in CSS pixels.
    pub viewport: Size,
    /// Document scroll offset.
    pub scroll: Point,
    /// The map section's bounding rect, if measured.
    pub section: Option<Rect>,
    /// The map image's bounding rect, if measured. Marker percentages resolve against this.
    pub map: Option<Rect>,
    /// Each marker element's bounding rect.
    pub markers: HashMap<MarkerId, Rect>,
}

impl Geometry {
    /// Vertical center of the viewport.
    #[must_use]
    pub fn viewport_center_y(&self) -> f64 {
        self.viewport.height * 0.5
    }

    /// Whether any part of the map section is on screen.
    #[must_use]
    pub fn section_in_view(&self) -> bool {
        self.section
            .is_some_and(|rect| rect.intersects_vertically(self.viewport.height))
    }

    /// The marker's rect, only if it has been laid out.
    #[must_use]
    pub fn marker_rect(&self, id: &MarkerId) -> Option<Rect> {
        self.markers.get(id).copied().filter(Rect::is_measured)
    }
}
