//! Selection resolver: the priority table that turns a tick's inputs into
//! one `SelectionState`.
//!
//! DESIGN
//! ======
//! Every `Input` belongs to exactly one `Rule`. A tick walks [`PRIORITY`]
//! from the top; the first rule that has inputs in the tick *and* whose
//! condition holds computes the next state, and every other input in the
//! tick is superseded. Rules never run side effects directly: the caller
//! gets an [`Outcome`] describing what changed (including whether the
//! external lock needs its expiry task armed or cancelled).
//!
//! Leaving the section sits at the top of the table: it clears every lock
//! even when a click or jump arrives in the same frame.
//!
//! Pointer position is tracked for every hover input in the tick, even when
//! the hover rule itself does not fire, so that "is the pointer over a
//! marker" stays true to the DOM while a lock holds. Once the lock is gone a
//! proximity tick picks that pointer position back up.

use crate::input::{Input, SelectionState, Source};
use crate::marker::{Catalog, MarkerId};

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Click,
    External,
    Outside,
    Hover,
    Proximity,
    SectionLeft,
}

/// Rules in descending priority.
pub const PRIORITY: [Rule; 6] = [
    Rule::SectionLeft,
    Rule::Click,
    Rule::External,
    Rule::Outside,
    Rule::Hover,
    Rule::Proximity,
];

impl Rule {
    /// The rule an input is handled by.
    #[must_use]
    pub fn for_input(input: &Input) -> Self {
        match input {
            Input::MarkerClick(_) => Self::Click,
            Input::ExternalJump(_) => Self::External,
            Input::OutsideInteraction => Self::Outside,
            Input::HoverEnter(_) | Input::HoverLeave(_) | Input::CardLeave => Self::Hover,
            Input::ProximityTick => Self::Proximity,
            Input::SectionLeft => Self::SectionLeft,
        }
    }

    /// Position in [`PRIORITY`]; lower is stronger.
    #[must_use]
    pub fn rank(self) -> usize {
        PRIORITY.iter().position(|r| *r == self).unwrap_or(PRIORITY.len())
    }
}

/// How the external lock changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LockChange {
    #[default]
    Unchanged,
    /// A new window opened; its expiry must be scheduled (replacing any pending one).
    Armed { until_ms: f64 },
    /// The window was cleared; any pending expiry must be cancelled.
    Released,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    /// The rule that fired, if any.
    pub fired: Option<Rule>,
    /// Active marker or source differs from before the tick.
    pub changed: bool,
    /// Active marker id differs from before the tick.
    pub marker_changed: bool,
    pub lock: LockChange,
}

/// Everything a tick needs besides the inputs themselves.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Host timestamp in ms.
    pub now_ms: f64,
    pub catalog: &'a Catalog,
    /// Nearest marker within the proximity tolerance, if any.
    pub focused: Option<&'a MarkerId>,
    pub section_in_view: bool,
}

impl ResolveContext<'_> {
    fn proximity_target(&self) -> Option<&MarkerId> {
        if self.section_in_view { self.focused } else { None }
    }
}

/// Owner of the `SelectionState`.
#[derive(Debug, Clone)]
pub struct SelectionResolver {
    state: SelectionState,
    hovered: Option<MarkerId>,
    external_lock_ms: f64,
}

impl SelectionResolver {
    #[must_use]
    pub fn new(external_lock_ms: f64) -> Self {
        Self { state: SelectionState::default(), hovered: None, external_lock_ms }
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The marker currently under the pointer, if any.
    #[cfg(test)]
    #[must_use]
    pub fn hovered(&self) -> Option<&MarkerId> {
        self.hovered.as_ref()
    }

    /// Resolve one tick.
    pub fn resolve(&mut self, inputs: &[Input], ctx: &ResolveContext<'_>) -> Outcome {
        self.track_hover(inputs, ctx.catalog);

        let mut outcome = Outcome::default();
        for rule in PRIORITY {
            if !inputs.iter().any(|i| Rule::for_input(i) == rule) {
                continue;
            }
            if let Some(next) = self.next_state(rule, inputs, ctx) {
                outcome = self.commit(rule, next);
                break;
            }
        }

        for input in inputs {
            let rule = Rule::for_input(input);
            match outcome.fired {
                Some(fired) if rule == fired => {}
                Some(fired) if rule.rank() > fired.rank() => {
                    tracing::debug!(?input, ?fired, "input superseded by higher-priority rule");
                }
                _ => tracing::trace!(?input, "input not applicable this tick"),
            }
        }

        outcome
    }

    /// Close the external override window. The active marker is kept.
    ///
    /// Returns `true` if a window was open.
    pub fn expire_external_lock(&mut self) -> bool {
        if self.state.external_lock_until.take().is_some() {
            tracing::debug!(phase = %self.state.phase(), "external lock expired");
            return true;
        }
        false
    }

    /// Back to a freshly mounted state.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        self.hovered = None;
    }

    fn track_hover(&mut self, inputs: &[Input], catalog: &Catalog) {
        for input in inputs {
            match input {
                Input::HoverEnter(id) if catalog.contains(id) => self.hovered = Some(id.clone()),
                Input::HoverLeave(id) if self.hovered.as_ref() == Some(id) => self.hovered = None,
                Input::CardLeave | Input::SectionLeft => self.hovered = None,
                _ => {}
            }
        }
    }

    /// The state `rule` would produce, or `None` if its condition does not hold.
    fn next_state(&self, rule: Rule, inputs: &[Input], ctx: &ResolveContext<'_>) -> Option<SelectionState> {
        let state = &self.state;
        match rule {
            Rule::Click => {
                let id = inputs.iter().rev().find_map(|i| match i {
                    Input::MarkerClick(id) if ctx.catalog.contains(id) => Some(id),
                    _ => None,
                })?;
                Some(SelectionState {
                    active: Some(id.clone()),
                    source: Some(Source::Click),
                    locked_by_click: true,
                    external_lock_until: None,
                })
            }
            Rule::External => {
                let id = inputs.iter().rev().find_map(|i| match i {
                    Input::ExternalJump(id) => self.accept_jump(id, ctx),
                    _ => None,
                })?;
                Some(SelectionState {
                    active: Some(id.clone()),
                    source: Some(Source::External),
                    locked_by_click: false,
                    external_lock_until: Some(ctx.now_ms + self.external_lock_ms),
                })
            }
            Rule::Outside => {
                let sticky = matches!(state.source, Some(Source::Click | Source::External));
                if !(state.locked_by_click || state.external_lock_until.is_some() || sticky) {
                    return None;
                }
                Some(proximity_state(ctx))
            }
            Rule::Hover => {
                if state.is_locked(ctx.now_ms) {
                    return None;
                }
                match &self.hovered {
                    Some(id) => Some(hover_state(id)),
                    None if state.source == Some(Source::Hover) => Some(proximity_state(ctx)),
                    None => None,
                }
            }
            Rule::Proximity => {
                if state.is_locked(ctx.now_ms) {
                    return None;
                }
                // A pointer still resting on a marker outranks scroll position.
                match &self.hovered {
                    Some(id) => Some(hover_state(id)),
                    None => Some(proximity_state(ctx)),
                }
            }
            Rule::SectionLeft => Some(SelectionState::default()),
        }
    }

    fn accept_jump<'a>(&self, id: &'a MarkerId, ctx: &ResolveContext<'_>) -> Option<&'a MarkerId> {
        if !ctx.catalog.contains(id) {
            tracing::warn!(marker = %id, "ignoring jump to unknown marker");
            return None;
        }
        if self.state.is_active(id, Source::External) && self.state.external_lock_active(ctx.now_ms) {
            tracing::debug!(marker = %id, "ignoring repeated jump within lock window");
            return None;
        }
        Some(id)
    }

    fn commit(&mut self, rule: Rule, next: SelectionState) -> Outcome {
        let prev = std::mem::replace(&mut self.state, next);
        let state = &self.state;

        let lock = match (prev.external_lock_until, state.external_lock_until) {
            (_, Some(until_ms)) if prev.external_lock_until != Some(until_ms) => LockChange::Armed { until_ms },
            (Some(_), None) => LockChange::Released,
            _ => LockChange::Unchanged,
        };
        let marker_changed = prev.active != state.active;
        let changed = marker_changed || prev.source != state.source;

        if changed {
            tracing::debug!(?rule, from = %prev.phase(), to = %state.phase(), "selection transition");
        }

        Outcome { fired: Some(rule), changed, marker_changed, lock }
    }
}

/// Selection following the pointer.
fn hover_state(id: &MarkerId) -> SelectionState {
    SelectionState {
        active: Some(id.clone()),
        source: Some(Source::Hover),
        locked_by_click: false,
        external_lock_until: None,
    }
}

/// Selection driven only by scroll position: the focused marker, or idle. Clears every lock.
fn proximity_state(ctx: &ResolveContext<'_>) -> SelectionState {
    match ctx.proximity_target() {
        Some(id) => SelectionState {
            active: Some(id.clone()),
            source: Some(Source::Scroll),
            locked_by_click: false,
            external_lock_until: None,
        },
        None => SelectionState::default(),
    }
}
