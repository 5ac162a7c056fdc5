//! Marker model: landmark records, their wire shape, and the in-memory catalog.
//!
//! Markers come from the content store as JSON records (`MarkerRecord`),
//! are validated into `Marker`s, and are held in catalog order by `Catalog`.
//! Catalog order matters: it is the tie-break for proximity. Nothing in the
//! engine mutates a marker after load.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "marker_test.rs"]
mod marker_test;

/// Stable identifier for a marker, as stored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl MarkerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Which side of the marker the annotation card opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Right,
}

/// Display payload for the annotation card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerContent {
    pub title: String,
    pub description: String,
    /// Optional external link shown on the card.
    pub link: Option<String>,
}

/// A validated landmark on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    /// Horizontal position as a percentage of the map image width, in `[0, 100]`.
    pub x_pct: f64,
    /// Vertical position as a percentage of the map image height, in `[0, 100]`.
    pub y_pct: f64,
    pub side: Side,
    pub content: MarkerContent,
}

/// A marker as the content store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Error returned by catalog sources.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The source could not be reached or refused the read.
    #[error("marker catalog fetch failed: {0}")]
    Fetch(String),
    /// The payload is not a list of marker records.
    #[error("malformed marker catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Anything that can supply the marker list for one page view.
pub trait MarkerCatalog {
    /// Read every marker record, in display order.
    fn fetch(&self) -> Result<Vec<MarkerRecord>, CatalogError>;
}

/// Parse a JSON array of marker records.
pub fn parse_records(raw: &str) -> Result<Vec<MarkerRecord>, CatalogError> {
    Ok(serde_json::from_str(raw)?)
}

/// Load state of the catalog, as the presentation layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    /// No fetch has completed yet.
    #[default]
    Loading,
    /// At least one marker is available.
    Ready,
    /// The fetch succeeded but produced no usable markers.
    Empty,
    /// The fetch failed; the map shows no data.
    Failed,
}

/// Ordered, read-only store of markers for the current page view.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    markers: Vec<Marker>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from raw records.
    ///
    /// Records with an empty or duplicate id are dropped (first one wins).
    /// Positions outside `[0, 100]` are clamped; non-finite positions drop
    /// the record.
    #[must_use]
    pub fn from_records(records: Vec<MarkerRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut markers = Vec::with_capacity(records.len());
        for record in records {
            if record.id.trim().is_empty() {
                tracing::warn!("dropping marker record with empty id");
                continue;
            }
            if !seen.insert(record.id.clone()) {
                tracing::warn!(id = %record.id, "dropping duplicate marker id");
                continue;
            }
            let (Some(x_pct), Some(y_pct)) = (clamp_pct(&record.id, record.x), clamp_pct(&record.id, record.y))
            else {
                tracing::warn!(id = %record.id, "dropping marker with non-finite position");
                continue;
            };
            markers.push(Marker {
                id: MarkerId(record.id),
                x_pct,
                y_pct,
                side: record.side,
                content: MarkerContent {
                    title: record.title,
                    description: record.description,
                    link: record.link.filter(|l| !l.trim().is_empty()),
                },
            });
        }
        Self { markers }
    }

    /// Look up a marker by id.
    #[must_use]
    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &MarkerId) -> bool {
        self.get(id).is_some()
    }

    /// Markers in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

fn clamp_pct(id: &str, value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if !(0.0..=100.0).contains(&value) {
        tracing::warn!(%id, value, "marker position outside [0, 100]; clamping");
    }
    Some(value.clamp(0.0, 100.0))
}
