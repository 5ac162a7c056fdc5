//! Browser host: wires DOM events into [`EngineCore`] and executes its actions.
//!
//! The host owns no selection logic. It measures geometry once per animation
//! frame, classifies event targets into [`ElementRole`] chains, and carries
//! out `Action`s (frames, timers, scrolling, callbacks). All listeners,
//! timers, and frames are released on [`JourneyMap::teardown`] or drop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{
    CustomEvent, Element, Event, EventTarget, KeyboardEvent, MouseEvent, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

use crate::config::EngineConfig;
use crate::engine::{Action, EngineCore};
use crate::geom::{Geometry, Point, Rect, Size};
use crate::hit::{CARD_ATTR, ClickId, ElementInfo, ElementRole, MARKER_ATTR};
use crate::marker::{CatalogError, MarkerCatalog, MarkerId, MarkerRecord, parse_records};
use crate::timer::TaskId;

/// Attribute on the map section carrying the JSON engine config.
pub const CONFIG_ATTR: &str = "data-journey-config";

/// Attribute on the map image element inside the section.
pub const MAP_ATTR: &str = "data-journey-map";

/// Name of the page-level jump event; `detail` is the marker id.
pub const SELECT_EVENT: &str = "select-marker";

type Handler = fn(&Host, &Event) -> Vec<Action>;

/// Catalog backed by the content store's JSON response.
struct JsonCatalog<'a>(&'a str);

impl MarkerCatalog for JsonCatalog<'_> {
    fn fetch(&self) -> Result<Vec<MarkerRecord>, CatalogError> {
        parse_records(self.0)
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

struct Host {
    core: RefCell<EngineCore>,
    window: Window,
    section: Element,
    frame_cb: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    frame_handle: Cell<Option<i32>>,
    timeouts: RefCell<HashMap<TaskId, Timeout>>,
    listeners: RefCell<Vec<Listener>>,
    on_render: js_sys::Function,
    on_navigate: js_sys::Function,
}

/// A mounted journey map section.
#[wasm_bindgen]
pub struct JourneyMap {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl JourneyMap {
    /// Mount on `section` with the catalog JSON.
    ///
    /// `on_render` receives the render frame as a JSON string whenever it
    /// changes; `on_navigate` receives a marker id for "view details".
    #[wasm_bindgen(constructor)]
    pub fn new(
        section: Element,
        markers_json: &str,
        on_render: js_sys::Function,
        on_navigate: js_sys::Function,
    ) -> Result<JourneyMap, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let config = EngineConfig::from_json_or_default(&section.get_attribute(CONFIG_ATTR).unwrap_or_default());

        let host = Rc::new(Host {
            core: RefCell::new(EngineCore::new(config)),
            window,
            section,
            frame_cb: RefCell::new(None),
            frame_handle: Cell::new(None),
            timeouts: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
            on_render,
            on_navigate,
        });

        let weak = Rc::downgrade(&host);
        let frame_cb = Closure::wrap(Box::new(move |ts: f64| {
            if let Some(host) = weak.upgrade() {
                host.frame_handle.set(None);
                let geometry = host.measure();
                let actions = host.core.borrow_mut().on_animation_frame(ts, geometry);
                Host::run(&host, actions);
            }
        }) as Box<dyn FnMut(f64)>);
        *host.frame_cb.borrow_mut() = Some(frame_cb);

        let window_target: EventTarget = host.window.clone().into();
        let section_target: EventTarget = host.section.clone().into();
        Host::listen(&host, &window_target, "scroll", |h, _| h.core.borrow_mut().on_scroll());
        Host::listen(&host, &window_target, "resize", |h, _| h.core.borrow_mut().on_resize());
        Host::listen(&host, &section_target, "click", on_click);
        Host::listen(&host, &section_target, "mouseover", on_mouse_over);
        Host::listen(&host, &section_target, "mouseout", on_mouse_out);
        Host::listen(&host, &section_target, "keydown", on_key_down);
        if let Some(document) = host.window.document() {
            let document_target: EventTarget = document.into();
            Host::listen(&host, &document_target, "click", on_click);
            Host::listen(&host, &document_target, SELECT_EVENT, on_select_marker);
        }

        let actions = host.core.borrow_mut().mount(&JsonCatalog(markers_json));
        Host::run(&host, actions);
        Ok(JourneyMap { host })
    }

    /// Remove all listeners and cancel pending timers and frames.
    pub fn teardown(&self) {
        Host::teardown(&self.host);
    }

    /// "View details" on the active card.
    #[wasm_bindgen(js_name = viewDetails)]
    pub fn view_details(&self) {
        let action = self.host.core.borrow().view_details();
        Host::run(&self.host, action.into_iter().collect());
    }

    /// Open the active marker's external link, if any.
    #[wasm_bindgen(js_name = openLink)]
    pub fn open_link(&self) {
        let action = self.host.core.borrow().open_link();
        Host::run(&self.host, action.into_iter().collect());
    }

    /// The current render frame as JSON.
    #[wasm_bindgen(js_name = renderFrame)]
    pub fn render_frame(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.host.core.borrow().render_frame()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pulse delays for the idle marker animation as JSON.
    #[wasm_bindgen(js_name = pulsePhases)]
    pub fn pulse_phases(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.core.borrow().pulse_phases()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Drop for JourneyMap {
    fn drop(&mut self) {
        Host::teardown(&self.host);
    }
}

impl Host {
    fn listen(host: &Rc<Self>, target: &EventTarget, kind: &'static str, handler: Handler) {
        let weak: Weak<Self> = Rc::downgrade(host);
        let closure = Closure::wrap(Box::new(move |ev: Event| {
            if let Some(host) = weak.upgrade() {
                let actions = handler(&host, &ev);
                Self::run(&host, actions);
            }
        }) as Box<dyn FnMut(Event)>);

        if let Err(e) = target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
            tracing::warn!(kind, error = ?e, "failed to add listener");
            return;
        }
        host.listeners.borrow_mut().push(Listener { target: target.clone(), kind, closure });
    }

    fn teardown(host: &Rc<Self>) {
        for listener in host.listeners.borrow_mut().drain(..) {
            if let Err(e) = listener
                .target
                .remove_event_listener_with_callback(listener.kind, listener.closure.as_ref().unchecked_ref())
            {
                tracing::warn!(kind = listener.kind, error = ?e, "failed to remove listener");
            }
        }
        let actions = host.core.borrow_mut().teardown();
        Self::run(host, actions);
        host.timeouts.borrow_mut().clear();
        host.frame_cb.borrow_mut().take();
    }

    fn run(host: &Rc<Self>, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::RequestFrame => host.request_frame(),
                Action::CancelFrame => host.cancel_frame(),
                Action::ScheduleTask { id, delay_ms } => Self::schedule(host, id, delay_ms),
                Action::CancelTask(id) => {
                    // Dropping a gloo `Timeout` clears it.
                    host.timeouts.borrow_mut().remove(&id);
                }
                Action::ScrollIntoView(id) => host.scroll_into_view(&id),
                Action::Navigate(id) => {
                    if let Err(e) = host.on_navigate.call1(&JsValue::NULL, &JsValue::from_str(id.as_str())) {
                        tracing::warn!(marker = %id, error = ?e, "navigate callback failed");
                    }
                }
                Action::OpenLink(url) => {
                    if let Err(e) = host.window.open_with_url_and_target(&url, "_blank") {
                        tracing::warn!(url, error = ?e, "failed to open link");
                    }
                }
                Action::RenderNeeded => host.render(),
            }
        }
    }

    fn request_frame(&self) {
        let frame_cb = self.frame_cb.borrow();
        let Some(cb) = frame_cb.as_ref() else {
            return;
        };
        match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(handle) => self.frame_handle.set(Some(handle)),
            Err(e) => tracing::warn!(error = ?e, "requestAnimationFrame failed"),
        }
    }

    fn cancel_frame(&self) {
        if let Some(handle) = self.frame_handle.take() {
            if let Err(e) = self.window.cancel_animation_frame(handle) {
                tracing::warn!(error = ?e, "cancelAnimationFrame failed");
            }
        }
    }

    fn schedule(host: &Rc<Self>, id: TaskId, delay_ms: f64) {
        let weak = Rc::downgrade(host);
        let timeout = Timeout::new(timeout_millis(delay_ms), move || {
            if let Some(host) = weak.upgrade() {
                host.timeouts.borrow_mut().remove(&id);
                let actions = host.core.borrow_mut().on_timer(id);
                Self::run(&host, actions);
            }
        });
        host.timeouts.borrow_mut().insert(id, timeout);
    }

    fn scroll_into_view(&self, id: &MarkerId) {
        let Some(el) = self.marker_elements().into_iter().find_map(|(mid, el)| (mid == *id).then_some(el)) else {
            tracing::debug!(marker = %id, "no element to scroll to");
            return;
        };
        let opts = ScrollIntoViewOptions::new();
        opts.set_behavior(ScrollBehavior::Smooth);
        opts.set_block(ScrollLogicalPosition::Center);
        el.scroll_into_view_with_scroll_into_view_options(&opts);
    }

    fn render(&self) {
        let json = match serde_json::to_string(self.core.borrow().render_frame()) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode render frame");
                return;
            }
        };
        if let Err(e) = self.on_render.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            tracing::warn!(error = ?e, "render callback failed");
        }
    }

    /// Snapshot everything the core needs for one frame.
    fn measure(&self) -> Geometry {
        let viewport = Size::new(js_number(self.window.inner_width()), js_number(self.window.inner_height()));
        let scroll = Point::new(self.window.scroll_x().unwrap_or(0.0), self.window.scroll_y().unwrap_or(0.0));
        let map = match self.section.query_selector(&format!("[{MAP_ATTR}]")) {
            Ok(el) => el.as_ref().map(rect_of),
            Err(_) => None,
        };
        let markers = self.marker_elements().into_iter().map(|(id, el)| (id, rect_of(&el))).collect();
        Geometry { viewport, scroll, section: Some(rect_of(&self.section)), map, markers }
    }

    fn marker_elements(&self) -> Vec<(MarkerId, Element)> {
        let Ok(list) = self.section.query_selector_all(&format!("[{MARKER_ATTR}]")) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_ref::<Element>().cloned())
            .filter_map(|el| el.get_attribute(MARKER_ATTR).map(|id| (MarkerId::new(id), el)))
            .collect()
    }
}

// =============================================================
// Event handlers
// =============================================================

fn on_click(host: &Host, ev: &Event) -> Vec<Action> {
    let chain = ancestor_roles(ev.target());
    host.core.borrow_mut().on_click(ClickId::from_time_stamp(ev.time_stamp()), &chain)
}

fn on_mouse_over(host: &Host, ev: &Event) -> Vec<Action> {
    match marker_in(&ancestor_roles(ev.target())) {
        Some(id) => host.core.borrow_mut().on_hover_enter(id),
        None => Vec::new(),
    }
}

fn on_mouse_out(host: &Host, ev: &Event) -> Vec<Action> {
    let from = ancestor_roles(ev.target());
    let to = ancestor_roles(ev.dyn_ref::<MouseEvent>().and_then(MouseEvent::related_target));
    let mut actions = Vec::new();
    if let Some(id) = marker_in(&from) {
        if marker_in(&to).as_ref() != Some(&id) {
            actions.extend(host.core.borrow_mut().on_hover_leave(id));
        }
    }
    if in_card(&from) && !in_card(&to) {
        actions.extend(host.core.borrow_mut().on_card_leave());
    }
    actions
}

fn on_key_down(host: &Host, ev: &Event) -> Vec<Action> {
    let Some(key) = ev.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
        return Vec::new();
    };
    if key != "Enter" && key != " " {
        return Vec::new();
    }
    // Only the focused element itself, not its ancestors.
    match ancestor_roles(ev.target()).first() {
        Some(ElementRole::Marker(id)) => {
            ev.prevent_default();
            host.core.borrow_mut().on_marker_activate(id.clone())
        }
        _ => Vec::new(),
    }
}

fn on_select_marker(host: &Host, ev: &Event) -> Vec<Action> {
    match ev.dyn_ref::<CustomEvent>().and_then(|ce| ce.detail().as_string()) {
        Some(id) => host.core.borrow_mut().on_select_marker(MarkerId::new(id)),
        None => {
            tracing::warn!("select-marker event without a string detail");
            Vec::new()
        }
    }
}

// =============================================================
// DOM helpers
// =============================================================

/// Roles of `target` and its ancestors, innermost first.
fn ancestor_roles(target: Option<EventTarget>) -> Vec<ElementRole> {
    let mut roles = Vec::new();
    let mut current = target.as_ref().and_then(|t| t.dyn_ref::<Element>()).cloned();
    while let Some(el) = current {
        let tag = el.tag_name();
        let marker_id = el.get_attribute(MARKER_ATTR);
        let aria_role = el.get_attribute("role");
        roles.push(ElementRole::from_info(&ElementInfo {
            tag: &tag,
            marker_id: marker_id.as_deref(),
            card: el.has_attribute(CARD_ATTR),
            aria_role: aria_role.as_deref(),
        }));
        current = el.parent_element();
    }
    roles
}

fn marker_in(roles: &[ElementRole]) -> Option<MarkerId> {
    roles.iter().find_map(|r| match r {
        ElementRole::Marker(id) => Some(id.clone()),
        _ => None,
    })
}

fn in_card(roles: &[ElementRole]) -> bool {
    roles.contains(&ElementRole::Card)
}

fn rect_of(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.x(), r.y(), r.width(), r.height())
}

fn js_number(value: Result<JsValue, JsValue>) -> f64 {
    value.map_or(0.0, |v| v.as_f64().unwrap_or(0.0))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn timeout_millis(delay_ms: f64) -> u32 {
    delay_ms.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}
