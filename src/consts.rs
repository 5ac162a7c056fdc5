//! Shared numeric defaults for the journey map engine.

// ── Selection ───────────────────────────────────────────────────

/// Max distance in pixels between a marker's center and the viewport's
/// vertical center for scrolling to auto-select it.
pub const PROXIMITY_TOLERANCE_PX: f64 = 30.0;

/// How long an external jump keeps hover and scroll from taking over, in ms.
pub const EXTERNAL_LOCK_MS: f64 = 1000.0;

// ── Annotation ──────────────────────────────────────────────────

/// Duration of the connector line draw-in, in ms.
pub const LINE_DURATION_MS: f64 = 300.0;

/// Default annotation card width in CSS pixels.
pub const CARD_WIDTH_PX: f64 = 320.0;

/// Default annotation card height in CSS pixels.
pub const CARD_HEIGHT_PX: f64 = 180.0;

/// Horizontal gap between the marker anchor and the facing card edge.
pub const CARD_GAP_PX: f64 = 24.0;

// ── Decor ───────────────────────────────────────────────────────

/// Seed for marker pulse phases when the page config does not provide one.
pub const DEFAULT_DECOR_SEED: u64 = 0x6a6f_7572_6e65_79;

/// Upper bound of a marker's pulse animation delay, in ms.
pub const MAX_PULSE_DELAY_MS: f64 = 2400.0;
