//! Connector line draw-in.
//!
//! Progress is a pure function of the current time and when the animation
//! last restarted. A restart happens only when the active marker changes,
//! so re-activating the same marker (hover after scroll, repeated hover)
//! leaves a finished line finished.

use crate::marker::MarkerId;

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

#[derive(Debug, Clone)]
pub struct LineAnimator {
    duration_ms: f64,
    target: Option<MarkerId>,
    started_ms: f64,
}

impl LineAnimator {
    #[must_use]
    pub fn new(duration_ms: f64) -> Self {
        Self { duration_ms, target: None, started_ms: 0.0 }
    }

    /// Point the line at `marker`. Returns `true` if the animation restarted.
    pub fn retarget(&mut self, marker: Option<&MarkerId>, now_ms: f64) -> bool {
        if self.target.as_ref() == marker {
            return false;
        }
        self.target = marker.cloned();
        self.started_ms = now_ms;
        self.target.is_some()
    }

    /// Linear progress in `[0, 1]`; 0 when there is no target.
    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.target.is_none() {
            return 0.0;
        }
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Whether the host should keep requesting frames for the draw-in.
    #[must_use]
    pub fn is_running(&self, now_ms: f64) -> bool {
        self.target.is_some() && self.progress(now_ms) < 1.0
    }

    #[cfg(test)]
    #[must_use]
    pub fn target(&self) -> Option<&MarkerId> {
        self.target.as_ref()
    }

    /// Stop and forget the target.
    pub fn stop(&mut self) {
        self.target = None;
    }
}
