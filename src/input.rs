//! Input model: selection sources, the input events the resolver consumes,
//! and the single `SelectionState` value.
//!
//! `Input` is what the host reports (a click on a marker, a hover change, a
//! scroll tick, a jump request). `SelectionState` is what the resolver
//! derives from it. Nothing outside [`crate::resolver`] writes to a
//! `SelectionState`.

use std::fmt;

use serde::Serialize;

use crate::marker::MarkerId;

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

/// Which input last set the active marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Explicit click on the marker.
    Click,
    /// Pointer is over the marker.
    Hover,
    /// Marker is nearest the viewport center.
    Scroll,
    /// Another part of the page asked for this marker.
    External,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Scroll => "scroll",
            Self::External => "external",
        })
    }
}

/// A classified input event for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Primary click on a marker element.
    MarkerClick(MarkerId),
    /// `select-marker` request from elsewhere on the page.
    ExternalJump(MarkerId),
    /// A click that landed outside every marker, the card, and every control.
    OutsideInteraction,
    /// Pointer entered a marker element.
    HoverEnter(MarkerId),
    /// Pointer left a marker element.
    HoverLeave(MarkerId),
    /// Pointer left the annotation card.
    CardLeave,
    /// Proximity was recomputed for this frame.
    ProximityTick,
    /// The map section scrolled fully out of the viewport.
    SectionLeft,
}

/// The resolver's single source of truth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub active: Option<MarkerId>,
    pub source: Option<Source>,
    /// Set by an explicit click; hover and scroll are ignored until an outside interaction.
    pub locked_by_click: bool,
    /// End of the external override window, as a host timestamp in ms.
    pub external_lock_until: Option<f64>,
}

/// Borrowed view of the state as its two machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<'a> {
    Idle,
    Active(&'a MarkerId, Source),
}

impl fmt::Display for Phase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Active(id, source) => write!(f, "active({id}, {source})"),
        }
    }
}

impl SelectionState {
    #[must_use]
    pub fn phase(&self) -> Phase<'_> {
        match (&self.active, self.source) {
            (Some(id), Some(source)) => Phase::Active(id, source),
            _ => Phase::Idle,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Whether the external override window is still open at `now_ms`.
    #[must_use]
    pub fn external_lock_active(&self, now_ms: f64) -> bool {
        self.external_lock_until.is_some_and(|until| now_ms < until)
    }

    /// Whether hover and scroll are currently kept from driving selection.
    #[must_use]
    pub fn is_locked(&self, now_ms: f64) -> bool {
        self.locked_by_click || self.external_lock_active(now_ms)
    }

    #[must_use]
    pub fn is_active(&self, id: &MarkerId, source: Source) -> bool {
        self.active.as_ref() == Some(id) && self.source == Some(source)
    }
}
