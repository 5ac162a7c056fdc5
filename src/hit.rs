//! Click classification: did a click land on something interactive?
//!
//! The host describes the click target's ancestor chain (innermost first)
//! as `ElementRole`s. The first interactive role found decides the result;
//! a chain with none is an outside interaction.
//!
//! The map section and the document both listen for clicks, so one physical
//! click can be reported twice. `OutsideInteractionDetector` remembers the
//! last click it saw and ignores repeats.

use crate::marker::MarkerId;

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

/// DOM attribute that tags a marker element with its id.
pub const MARKER_ATTR: &str = "data-marker-id";

/// DOM attribute present on the annotation card root.
pub const CARD_ATTR: &str = "data-annotation-card";

/// What one element in the target's ancestor chain is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementRole {
    Marker(MarkerId),
    Card,
    /// Button, link, or anything with an interactive ARIA role.
    Control,
    Other,
}

/// The parts of an element's markup that decide its role.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementInfo<'a> {
    /// Tag name as the DOM reports it (upper-case for HTML).
    pub tag: &'a str,
    /// Value of [`MARKER_ATTR`], if present.
    pub marker_id: Option<&'a str>,
    /// Whether [`CARD_ATTR`] is present.
    pub card: bool,
    /// Value of the `role` attribute, if present.
    pub aria_role: Option<&'a str>,
}

impl ElementRole {
    #[must_use]
    pub fn from_info(info: &ElementInfo<'_>) -> Self {
        if let Some(id) = info.marker_id.filter(|id| !id.is_empty()) {
            return Self::Marker(MarkerId::new(id));
        }
        if info.card {
            return Self::Card;
        }
        let control_tag = info.tag.eq_ignore_ascii_case("button") || info.tag.eq_ignore_ascii_case("a");
        let control_role = info
            .aria_role
            .is_some_and(|r| matches!(r, "button" | "link" | "menuitem" | "tab"));
        if control_tag || control_role {
            return Self::Control;
        }
        Self::Other
    }
}

/// Result of classifying a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Marker(MarkerId),
    Card,
    Control,
    Outside,
}

/// Classify a click by its ancestor chain, innermost element first.
#[must_use]
pub fn classify(chain: &[ElementRole]) -> Interaction {
    for role in chain {
        match role {
            ElementRole::Marker(id) => return Interaction::Marker(id.clone()),
            ElementRole::Card => return Interaction::Card,
            ElementRole::Control => return Interaction::Control,
            ElementRole::Other => {}
        }
    }
    Interaction::Outside
}

/// Identity of one physical click, derived from the DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickId(pub u64);

impl ClickId {
    /// Build from the event's `timeStamp`, which both listeners see unchanged.
    #[must_use]
    pub fn from_time_stamp(time_stamp: f64) -> Self {
        Self(time_stamp.to_bits())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutsideInteractionDetector {
    last_click: Option<ClickId>,
}

impl OutsideInteractionDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a click, or return `None` if this click was already handled
    /// by another listener.
    pub fn observe(&mut self, click: ClickId, chain: &[ElementRole]) -> Option<Interaction> {
        if self.last_click == Some(click) {
            tracing::trace!(?click, "click already classified");
            return None;
        }
        self.last_click = Some(click);
        Some(classify(chain))
    }
}
