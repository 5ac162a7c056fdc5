//! Decorative marker pulse offsets.
//!
//! Each marker's idle "pulse" ring starts at a different phase so the map
//! does not blink in unison. Phases come from a seeded RNG so the same
//! catalog and seed always produce the same offsets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::consts::MAX_PULSE_DELAY_MS;
use crate::marker::{Catalog, MarkerId};

#[cfg(test)]
#[path = "decor_test.rs"]
mod decor_test;

/// Animation delay for one marker's pulse ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PulsePhase {
    pub marker_id: MarkerId,
    pub delay_ms: f64,
}

/// One delay per marker, in catalog order.
#[must_use]
pub fn pulse_phases(catalog: &Catalog, seed: u64) -> Vec<PulsePhase> {
    let mut rng = StdRng::seed_from_u64(seed);
    catalog
        .iter()
        .map(|marker| PulsePhase {
            marker_id: marker.id.clone(),
            delay_ms: rng.random_range(0.0..MAX_PULSE_DELAY_MS).round(),
        })
        .collect()
}
