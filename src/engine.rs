//! Engine core: owns every component and turns host events into actions.
//!
//! ARCHITECTURE
//! ============
//! Host events (scroll, click, hover, `select-marker`) are queued, never
//! resolved on the spot. The first queued event asks the host for an
//! animation frame; the frame callback hands back fresh geometry and the
//! whole queue is resolved as one tick. That gives the two guarantees the
//! overlay depends on: proximity runs at most once per frame, and the
//! presentation layer sees exactly one resolved state per frame.
//!
//! Timers and frames are requested through [`Action`]s so this module never
//! touches the DOM and can be driven entirely from tests.

use serde::Serialize;

use crate::animation::LineAnimator;
use crate::config::EngineConfig;
use crate::consts::DEFAULT_DECOR_SEED;
use crate::decor::{self, PulsePhase};
use crate::geom::{Geometry, Size};
use crate::hit::{ClickId, ElementRole, Interaction, OutsideInteractionDetector};
use crate::input::{Input, SelectionState, Source};
use crate::layout::{self, AnnotationLayout, AnnotationPositioner};
use crate::marker::{Catalog, CatalogError, CatalogStatus, MarkerCatalog, MarkerId, MarkerRecord};
use crate::proximity::ProximityTracker;
use crate::resolver::{LockChange, Outcome, ResolveContext, Rule, SelectionResolver};
use crate::timer::{TaskId, TaskKind, Timers};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Requests from the engine to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Call [`EngineCore::on_animation_frame`] on the next animation frame.
    RequestFrame,
    /// Drop a previously requested animation frame.
    CancelFrame,
    /// Call [`EngineCore::on_timer`] with `id` after `delay_ms`.
    ScheduleTask { id: TaskId, delay_ms: f64 },
    /// Disarm the host timer for `id`.
    CancelTask(TaskId),
    /// Bring the marker into the viewport.
    ScrollIntoView(MarkerId),
    /// "View details" was chosen on this marker's card.
    Navigate(MarkerId),
    /// The card's external link was chosen.
    OpenLink(String),
    /// The published [`RenderFrame`] changed.
    RenderNeeded,
}

/// What the presentation layer paints for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RenderFrame {
    pub status: CatalogStatus,
    pub active: Option<MarkerId>,
    pub source: Option<Source>,
    /// Card and line, when a marker is active, laid out, and on screen.
    pub annotation: Option<AnnotationLayout>,
}

/// All engine logic that does not depend on the browser.
pub struct EngineCore {
    config: EngineConfig,
    catalog: Catalog,
    status: CatalogStatus,
    geometry: Geometry,
    section_in_view: bool,
    resolver: SelectionResolver,
    proximity: ProximityTracker,
    positioner: AnnotationPositioner,
    animator: LineAnimator,
    detector: OutsideInteractionDetector,
    timers: Timers,
    pending: Vec<Input>,
    frame_requested: bool,
    measure_requested: bool,
    torn_down: bool,
    frame: RenderFrame,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            resolver: SelectionResolver::new(config.external_lock_ms),
            proximity: ProximityTracker::new(config.proximity_tolerance_px),
            positioner: AnnotationPositioner::new(Size::new(config.card_width, config.card_height), config.card_gap_px),
            animator: LineAnimator::new(config.line_duration_ms),
            config,
            catalog: Catalog::new(),
            status: CatalogStatus::Loading,
            geometry: Geometry::default(),
            section_in_view: false,
            detector: OutsideInteractionDetector::new(),
            timers: Timers::new(),
            pending: Vec::new(),
            frame_requested: false,
            measure_requested: false,
            torn_down: false,
            frame: RenderFrame::default(),
        }
    }

    // --- Data inputs ---

    /// Fetch the catalog once and load it.
    pub fn mount(&mut self, source: &dyn MarkerCatalog) -> Vec<Action> {
        let fetched = source.fetch();
        self.load_catalog(fetched)
    }

    /// Load the result of a catalog fetch. A failure leaves the engine with
    /// no markers and a `Failed` status.
    pub fn load_catalog(&mut self, fetched: Result<Vec<MarkerRecord>, CatalogError>) -> Vec<Action> {
        if self.torn_down {
            return Vec::new();
        }
        match fetched {
            Ok(records) => {
                self.catalog = Catalog::from_records(records);
                self.status = if self.catalog.is_empty() { CatalogStatus::Empty } else { CatalogStatus::Ready };
                tracing::info!(markers = self.catalog.len(), "journey map catalog loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "journey map catalog unavailable");
                self.catalog = Catalog::new();
                self.status = CatalogStatus::Failed;
            }
        }
        self.measure_requested = true;
        let mut actions = Vec::new();
        self.request_frame(&mut actions);
        actions
    }

    // --- Host events ---

    /// The page scrolled. Coalesced into the next frame.
    pub fn on_scroll(&mut self) -> Vec<Action> {
        self.queue_measure()
    }

    /// The viewport resized. Coalesced into the next frame.
    pub fn on_resize(&mut self) -> Vec<Action> {
        self.queue_measure()
    }

    /// A click anywhere the engine listens (the document or the map section).
    ///
    /// `chain` is the target's ancestor chain, innermost first. The same
    /// physical click reported by both listeners is handled once.
    pub fn on_click(&mut self, click: ClickId, chain: &[ElementRole]) -> Vec<Action> {
        if self.torn_down {
            return Vec::new();
        }
        match self.detector.observe(click, chain) {
            Some(Interaction::Marker(id)) => self.queue(Input::MarkerClick(id)),
            Some(Interaction::Outside) => self.queue(Input::OutsideInteraction),
            Some(Interaction::Card | Interaction::Control) | None => Vec::new(),
        }
    }

    /// Keyboard activation of a marker (Enter/Space on a focused marker).
    pub fn on_marker_activate(&mut self, id: MarkerId) -> Vec<Action> {
        self.queue(Input::MarkerClick(id))
    }

    pub fn on_hover_enter(&mut self, id: MarkerId) -> Vec<Action> {
        self.queue(Input::HoverEnter(id))
    }

    pub fn on_hover_leave(&mut self, id: MarkerId) -> Vec<Action> {
        self.queue(Input::HoverLeave(id))
    }

    pub fn on_card_leave(&mut self) -> Vec<Action> {
        self.queue(Input::CardLeave)
    }

    /// A `select-marker` request from elsewhere on the page.
    pub fn on_select_marker(&mut self, id: MarkerId) -> Vec<Action> {
        self.queue(Input::ExternalJump(id))
    }

    /// A scheduled task's timer elapsed.
    pub fn on_timer(&mut self, id: TaskId) -> Vec<Action> {
        if self.torn_down {
            return Vec::new();
        }
        match self.timers.fire(id) {
            Some(TaskKind::ExternalLockExpiry) => {
                self.resolver.expire_external_lock();
            }
            None => tracing::trace!(task = id.get(), "stale task ignored"),
        }
        Vec::new()
    }

    /// Resolve everything queued since the last frame against fresh geometry.
    pub fn on_animation_frame(&mut self, now_ms: f64, geometry: Geometry) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.torn_down {
            return actions;
        }
        self.frame_requested = false;
        self.geometry = geometry;

        let was_in_view = self.section_in_view;
        self.section_in_view = self.geometry.section_in_view();
        let measured = std::mem::take(&mut self.measure_requested);
        let mut inputs = std::mem::take(&mut self.pending);

        if self.catalog.is_empty() {
            self.proximity.clear();
            inputs.clear();
        } else {
            self.proximity.update(&self.catalog, &self.geometry);
            if was_in_view && !self.section_in_view {
                inputs.push(Input::SectionLeft);
            } else if measured {
                inputs.push(Input::ProximityTick);
            }
        }

        if !inputs.is_empty() {
            let ctx = ResolveContext {
                now_ms,
                catalog: &self.catalog,
                focused: self.proximity.focused(),
                section_in_view: self.section_in_view,
            };
            let outcome = self.resolver.resolve(&inputs, &ctx);
            self.apply_outcome(&outcome, now_ms, &mut actions);
        }

        self.publish(now_ms, &mut actions);
        actions
    }

    /// Remove all pending work. The engine ignores every later call.
    pub fn teardown(&mut self) -> Vec<Action> {
        let mut actions: Vec<Action> = self.timers.cancel_all().into_iter().map(Action::CancelTask).collect();
        if std::mem::take(&mut self.frame_requested) {
            actions.push(Action::CancelFrame);
        }
        self.pending.clear();
        self.resolver.reset();
        self.animator.stop();
        self.proximity.clear();
        self.torn_down = true;
        tracing::debug!("journey map engine torn down");
        actions
    }

    // --- Card actions ---

    /// "View details" on the active marker's card.
    #[must_use]
    pub fn view_details(&self) -> Option<Action> {
        self.resolver.state().active.clone().map(Action::Navigate)
    }

    /// The active marker's external link, if it has one.
    #[must_use]
    pub fn open_link(&self) -> Option<Action> {
        let id = self.resolver.state().active.as_ref()?;
        let link = self.catalog.get(id)?.content.link.clone()?;
        Some(Action::OpenLink(link))
    }

    // --- Queries ---

    /// The most recently published frame.
    #[must_use]
    pub fn render_frame(&self) -> &RenderFrame {
        &self.frame
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        self.resolver.state()
    }

    #[must_use]
    pub fn status(&self) -> CatalogStatus {
        self.status
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Seeded pulse delays for the idle marker animation.
    #[must_use]
    pub fn pulse_phases(&self) -> Vec<PulsePhase> {
        decor::pulse_phases(&self.catalog, self.config.decor_seed.unwrap_or(DEFAULT_DECOR_SEED))
    }

    // --- Internals ---

    fn queue(&mut self, input: Input) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.torn_down {
            return actions;
        }
        self.pending.push(input);
        self.request_frame(&mut actions);
        actions
    }

    fn queue_measure(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.torn_down {
            return actions;
        }
        self.measure_requested = true;
        self.request_frame(&mut actions);
        actions
    }

    /// Ask for a frame unless one is already on its way.
    fn request_frame(&mut self, actions: &mut Vec<Action>) {
        if !self.frame_requested {
            self.frame_requested = true;
            actions.push(Action::RequestFrame);
        }
    }

    fn apply_outcome(&mut self, outcome: &Outcome, now_ms: f64, actions: &mut Vec<Action>) {
        if outcome.fired == Some(Rule::External) {
            if let Some(id) = self.resolver.state().active.clone() {
                actions.push(Action::ScrollIntoView(id));
            }
        }

        match outcome.lock {
            LockChange::Unchanged => {}
            LockChange::Armed { until_ms } => {
                let (cancelled, task) = self.timers.reschedule(TaskKind::ExternalLockExpiry, until_ms);
                actions.extend(cancelled.into_iter().map(Action::CancelTask));
                actions.push(Action::ScheduleTask { id: task.id, delay_ms: task.delay_from(now_ms) });
            }
            LockChange::Released => {
                let cancelled = self.timers.cancel_kind(TaskKind::ExternalLockExpiry);
                actions.extend(cancelled.into_iter().map(Action::CancelTask));
            }
        }

        if outcome.marker_changed {
            self.animator.retarget(self.resolver.state().active.as_ref(), now_ms);
        }
    }

    /// Rebuild the render frame; emit `RenderNeeded` if it changed and keep
    /// frames coming while the line is still drawing in.
    fn publish(&mut self, now_ms: f64, actions: &mut Vec<Action>) {
        let state = self.resolver.state();
        let annotation = if self.section_in_view { self.annotation(state.active.as_ref(), now_ms) } else { None };
        let next = RenderFrame { status: self.status, active: state.active.clone(), source: state.source, annotation };

        if next != self.frame {
            self.frame = next;
            actions.push(Action::RenderNeeded);
        }
        if self.frame.annotation.is_some() && self.animator.is_running(now_ms) {
            self.request_frame(actions);
        }
    }

    fn annotation(&self, active: Option<&MarkerId>, now_ms: f64) -> Option<AnnotationLayout> {
        let marker = self.catalog.get(active?)?;
        let anchor = layout::anchor_for(marker, &self.geometry)?;
        let placement = self
            .positioner
            .place(anchor, marker.side, self.geometry.viewport, self.geometry.scroll)?;
        Some(placement.with_progress(self.animator.progress(now_ms)))
    }
}
