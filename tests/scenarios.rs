//! End-to-end selection scenarios driven through the public engine API,
//! starting from the catalog JSON and page config the browser would hand in.
#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use journey_map::config::EngineConfig;
use journey_map::engine::{Action, EngineCore};
use journey_map::geom::{Geometry, Point, Rect, Size};
use journey_map::hit::{ClickId, ElementRole};
use journey_map::input::{Phase, Source};
use journey_map::marker::{CatalogError, CatalogStatus, MarkerCatalog, MarkerId, MarkerRecord, Side, parse_records};

const CATALOG_JSON: &str = r#"[
    {"id": "harbor", "x": 25, "y": 15, "side": "left", "title": "Harbor", "description": "Where it began."},
    {"id": "bridge", "x": 60, "y": 45, "title": "Bridge", "description": "Crossing over.", "link": "https://example.test/bridge"},
    {"id": "summit", "x": 80, "y": 85, "side": "left", "title": "Summit", "description": "The view."}
]"#;

struct ContentStore(&'static str);

impl MarkerCatalog for ContentStore {
    fn fetch(&self) -> Result<Vec<MarkerRecord>, CatalogError> {
        parse_records(self.0)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

/// A 1000x1000 map under a 1200x800 viewport, its top at `map_top`.
/// Marker anchors sit at `map_top + 10 * y_pct`.
fn page(map_top: f64) -> Geometry {
    let map = Rect::new(100.0, map_top, 1000.0, 1000.0);
    let markers: HashMap<MarkerId, Rect> = [("harbor", 25.0, 15.0), ("bridge", 60.0, 45.0), ("summit", 80.0, 85.0)]
        .into_iter()
        .map(|(id, x, y)| {
            let anchor = map.point_at_percent(x, y);
            (MarkerId::new(id), Rect::new(anchor.x - 12.0, anchor.y - 12.0, 24.0, 24.0))
        })
        .collect();
    Geometry {
        viewport: Size::new(1200.0, 800.0),
        scroll: Point::new(0.0, 1500.0),
        section: Some(map),
        map: Some(map),
        markers,
    }
}

/// Map top that puts the marker at `y_pct` exactly `offset` px below the viewport center.
fn centered_on(y_pct: f64, offset: f64) -> Geometry {
    page(400.0 + offset - 10.0 * y_pct)
}

fn mounted(config: &str) -> EngineCore {
    init_tracing();
    let mut core = EngineCore::new(EngineConfig::from_json_or_default(config));
    core.mount(&ContentStore(CATALOG_JSON));
    core.on_animation_frame(0.0, centered_on(45.0, 200.0));
    core
}

fn describe(core: &EngineCore) -> String {
    core.selection().phase().to_string()
}

#[test]
fn catalog_json_loads_in_order() {
    let core = mounted("");
    assert_eq!(core.status(), CatalogStatus::Ready);
    let ids: Vec<&str> = core.catalog().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["harbor", "bridge", "summit"]);
    assert_eq!(core.catalog().get(&MarkerId::new("bridge")).map(|m| m.side), Some(Side::Right));
}

#[test]
fn malformed_catalog_shows_no_data() {
    init_tracing();
    let mut core = EngineCore::default();
    core.mount(&ContentStore("{not json"));
    assert_eq!(core.status(), CatalogStatus::Failed);
    core.on_animation_frame(0.0, centered_on(45.0, 0.0));
    assert_eq!(core.selection().phase(), Phase::Idle);
}

#[test]
fn reading_down_the_page() {
    let mut core = mounted("");
    let mut seen = Vec::new();
    let mut now = 0.0;
    for (y_pct, offset) in [(15.0, 5.0), (15.0, 80.0), (45.0, -12.0), (85.0, 29.0), (85.0, 31.0)] {
        now += 16.0;
        core.on_scroll();
        core.on_animation_frame(now, centered_on(y_pct, offset));
        seen.push(describe(&core));
    }
    assert_eq!(
        seen,
        vec!["active(harbor, scroll)", "idle", "active(bridge, scroll)", "active(summit, scroll)", "idle"]
    );
}

#[test]
fn click_then_click_elsewhere() {
    let mut core = mounted("");
    core.on_click(ClickId::from_time_stamp(10.0), &[ElementRole::Marker(MarkerId::new("harbor"))]);
    core.on_animation_frame(16.0, centered_on(45.0, 200.0));
    assert_eq!(describe(&core), "active(harbor, click)");

    // Scroll brings bridge to center; the click still holds.
    core.on_scroll();
    core.on_animation_frame(32.0, centered_on(45.0, 0.0));
    assert_eq!(describe(&core), "active(harbor, click)");

    core.on_click(ClickId::from_time_stamp(40.0), &[ElementRole::Other]);
    core.on_animation_frame(48.0, centered_on(45.0, 0.0));
    assert_eq!(describe(&core), "active(bridge, scroll)");
}

#[test]
fn jump_from_the_itinerary_then_hover() {
    let mut core = mounted("");
    core.on_select_marker(MarkerId::new("summit"));
    let actions = core.on_animation_frame(100.0, centered_on(45.0, 200.0));
    assert_eq!(actions.first(), Some(&Action::ScrollIntoView(MarkerId::new("summit"))));
    assert!(actions.iter().any(|a| matches!(a, Action::ScheduleTask { delay_ms, .. } if *delay_ms == 1000.0)));

    core.on_hover_enter(MarkerId::new("bridge"));
    core.on_animation_frame(600.0, centered_on(85.0, 0.0));
    assert_eq!(describe(&core), "active(summit, external)");

    core.on_hover_leave(MarkerId::new("bridge"));
    core.on_hover_enter(MarkerId::new("bridge"));
    core.on_animation_frame(1200.0, centered_on(85.0, 0.0));
    assert_eq!(describe(&core), "active(bridge, hover)");
}

#[test]
fn configured_lock_and_tolerance_apply() {
    let mut core = mounted(r#"{"externalLockMs": 200, "proximityTolerancePx": 5}"#);

    core.on_scroll();
    core.on_animation_frame(16.0, centered_on(45.0, 8.0));
    assert_eq!(describe(&core), "idle");

    core.on_select_marker(MarkerId::new("harbor"));
    core.on_animation_frame(32.0, centered_on(45.0, 0.0));
    core.on_hover_enter(MarkerId::new("bridge"));
    core.on_animation_frame(300.0, centered_on(45.0, 0.0));
    assert_eq!(describe(&core), "active(bridge, hover)");
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let core = mounted(r#"{"lineDurationMs": -5}"#);
    assert_eq!(*core.config(), EngineConfig::default());
}

#[test]
fn card_layout_follows_the_active_marker() {
    let mut core = mounted("");
    core.on_hover_enter(MarkerId::new("bridge"));
    core.on_animation_frame(1000.0, centered_on(45.0, 0.0));
    let annotation = core.render_frame().annotation.expect("annotation");

    assert_eq!(annotation.side, Side::Right);
    // Document coordinates: the page is scrolled 1500px.
    assert_eq!(annotation.line.start, Point::new(700.0, 1900.0));
    assert_eq!(annotation.card.left(), 724.0);
    assert_eq!(annotation.line.target.y, annotation.card.center().y);

    core.on_animation_frame(1300.0, centered_on(45.0, 0.0));
    let annotation = core.render_frame().annotation.expect("annotation");
    assert_eq!(annotation.line.end, annotation.line.target);
}

#[test]
fn card_actions() {
    let mut core = mounted("");
    core.on_select_marker(MarkerId::new("bridge"));
    core.on_animation_frame(16.0, centered_on(45.0, 0.0));
    assert_eq!(core.view_details(), Some(Action::Navigate(MarkerId::new("bridge"))));
    assert_eq!(core.open_link(), Some(Action::OpenLink("https://example.test/bridge".to_owned())));
}

#[test]
fn at_most_one_active_marker_over_a_long_session() {
    let mut core = mounted("");
    let ids = ["harbor", "bridge", "summit", "nowhere"];
    let mut now = 0.0;
    for step in 0..200_u32 {
        now += 37.0;
        let id = MarkerId::new(ids[(step as usize * 7) % ids.len()]);
        match step % 9 {
            0 => core.on_click(ClickId::from_time_stamp(now), &[ElementRole::Marker(id)]),
            1 | 5 => core.on_hover_enter(id),
            2 => core.on_hover_leave(id),
            3 => core.on_select_marker(id),
            4 => core.on_click(ClickId::from_time_stamp(now), &[ElementRole::Other]),
            6 => core.on_card_leave(),
            _ => core.on_scroll(),
        };
        let offset = f64::from(step % 60) - 30.0;
        core.on_animation_frame(now, centered_on(15.0 + f64::from(step % 3) * 35.0, offset));

        let state = core.selection();
        assert_eq!(state.active.is_some(), state.source.is_some(), "step {step}: {state:?}");
        if let Some(active) = &state.active {
            assert!(core.catalog().contains(active), "step {step}: {state:?}");
        }
        if state.locked_by_click {
            assert_eq!(state.source, Some(Source::Click), "step {step}");
        }
        assert_eq!(core.render_frame().active, state.active, "step {step}");
    }
}

#[test]
fn teardown_ends_the_session() {
    let mut core = mounted("");
    core.on_select_marker(MarkerId::new("bridge"));
    core.on_animation_frame(16.0, centered_on(45.0, 0.0));
    let actions = core.teardown();
    assert!(actions.iter().any(|a| matches!(a, Action::CancelTask(_))));
    assert!(core.on_select_marker(MarkerId::new("harbor")).is_empty());
    assert!(core.is_torn_down());
}
