//! Selection and annotation-overlay engine for the interactive journey map.
//!
//! The map shows up to a few dozen markers over an image. At most one marker
//! is *active* at a time; the active marker gets an annotation card with a
//! connector line drawn in from the marker. Activation comes from four
//! competing sources (click, hover, scroll proximity, and external jump
//! requests from elsewhere on the page), resolved by one priority table.
//!
//! Everything except [`web`] is DOM-free and runs natively in tests. The
//! browser layer only measures geometry, forwards events, and executes the
//! [`engine::Action`]s the core returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`], host actions, render frames |
//! | [`resolver`] | Priority rule table producing the single selection state |
//! | [`input`] | Selection sources, tick inputs, and `SelectionState` |
//! | [`proximity`] | Nearest marker to the viewport's vertical center |
//! | [`layout`] | Card and connector-line placement |
//! | [`animation`] | Connector line draw-in progress |
//! | [`hit`] | Click classification and outside-interaction detection |
//! | [`timer`] | Cancellable scheduled tasks (external lock expiry) |
//! | [`marker`] | Marker records, the catalog, and the catalog source trait |
//! | [`geom`] | Points, sizes, rects, and per-frame measured geometry |
//! | [`config`] | Engine tunables parsed from the page |
//! | [`decor`] | Seeded pulse offsets for idle markers |
//! | [`consts`] | Default tunables |
//! | [`web`] | Browser host (feature `web`) |

pub mod animation;
pub mod config;
pub mod consts;
pub mod decor;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod input;
pub mod layout;
pub mod marker;
pub mod proximity;
pub mod resolver;
pub mod timer;
#[cfg(feature = "web")]
pub mod web;
