//! Scroll proximity: which marker sits closest to the viewport's vertical center.
//!
//! Only markers that are laid out and intersect the viewport vertically are
//! candidates. Ties go to the first marker in catalog order. Being nearest is
//! not enough to be selected; the marker must also be within the tolerance
//! window of dead-center (see [`ProximityTracker::focused`]).

use crate::geom::Geometry;
use crate::marker::{Catalog, MarkerId};

#[cfg(test)]
#[path = "proximity_test.rs"]
mod proximity_test;

/// The nearest on-screen marker for one scroll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityResult {
    pub marker_id: MarkerId,
    /// `|marker_center_y - viewport_center_y|` in pixels.
    pub distance: f64,
}

/// Find the marker whose center is nearest the viewport's vertical center.
#[must_use]
pub fn nearest(catalog: &Catalog, geometry: &Geometry) -> Option<ProximityResult> {
    let viewport_height = geometry.viewport.height;
    let center_y = geometry.viewport_center_y();
    let mut best: Option<ProximityResult> = None;

    for marker in catalog.iter() {
        let Some(rect) = geometry.marker_rect(&marker.id) else {
            continue;
        };
        if !rect.intersects_vertically(viewport_height) {
            continue;
        }
        let distance = (rect.center().y - center_y).abs();
        // Strict `<` keeps the earliest marker on ties.
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(ProximityResult { marker_id: marker.id.clone(), distance });
        }
    }

    best
}

/// Holds the latest proximity result between ticks.
#[derive(Debug, Clone)]
pub struct ProximityTracker {
    tolerance_px: f64,
    latest: Option<ProximityResult>,
}

impl ProximityTracker {
    #[must_use]
    pub fn new(tolerance_px: f64) -> Self {
        Self { tolerance_px, latest: None }
    }

    /// Recompute from the current geometry, replacing the previous result.
    pub fn update(&mut self, catalog: &Catalog, geometry: &Geometry) -> Option<&ProximityResult> {
        self.latest = nearest(catalog, geometry);
        self.latest.as_ref()
    }

    /// The latest nearest marker, regardless of tolerance.
    #[cfg(test)]
    #[must_use]
    pub fn latest(&self) -> Option<&ProximityResult> {
        self.latest.as_ref()
    }

    /// The nearest marker only if it is within the tolerance window.
    #[must_use]
    pub fn focused(&self) -> Option<&MarkerId> {
        self.latest
            .as_ref()
            .filter(|r| r.distance <= self.tolerance_px)
            .map(|r| &r.marker_id)
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}
