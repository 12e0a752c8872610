// Precinct boundaries, in the GeoJSON coordinate layout.

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::errors::*;

/// A position: longitude, latitude and optionally more dimensions.
pub type Position = Vec<f64>;

/// A closed ring of positions.
pub type LinearRing = Vec<Position>;

/// The exterior ring followed by the holes.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<LinearRing>);

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiPolygon(pub Vec<Polygon>);

/// A GeoJSON geometry object, before its coordinates are interpreted.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: JSValue,
}

const POLYGON: &str = "Polygon";
const MULTI_POLYGON: &str = "MultiPolygon";

/// Coerces a boundary to the multi-polygon stored against a precinct.
///
/// A multi-polygon is passed through, a polygon becomes a multi-polygon of
/// one element. Any other kind of geometry is rejected.
pub fn to_multi_polygon(geometry: &Geometry) -> ResultsResult<MultiPolygon> {
    let kind = geometry.kind.as_str();
    match kind {
        MULTI_POLYGON => serde_json::from_value(geometry.coordinates.clone())
            .context(MalformedGeometrySnafu { kind }),
        POLYGON => {
            let p: Polygon = serde_json::from_value(geometry.coordinates.clone())
                .context(MalformedGeometrySnafu { kind })?;
            Ok(MultiPolygon(vec![p]))
        }
        _ => UnsupportedGeometryTypeSnafu { kind }.fail(),
    }
}

impl MultiPolygon {
    pub fn polygons(&self) -> &[Polygon] {
        &self.0
    }

    pub fn to_geometry(&self) -> Geometry {
        Geometry {
            kind: MULTI_POLYGON.to_string(),
            coordinates: serde_json::json!(self),
        }
    }

    /// Well-known text, as used by spatial databases.
    pub fn to_wkt(&self) -> String {
        if self.0.is_empty() {
            return "MULTIPOLYGON EMPTY".to_string();
        }
        let polygons: Vec<String> = self
            .0
            .iter()
            .map(|p| {
                let rings: Vec<String> = p.0.iter().map(|r| wkt_ring(r)).collect();
                format!("({})", rings.join(", "))
            })
            .collect();
        format!("MULTIPOLYGON ({})", polygons.join(", "))
    }
}

fn wkt_ring(ring: &[Position]) -> String {
    let positions: Vec<String> = ring
        .iter()
        .map(|pos| {
            pos.iter()
                .map(|x| x.to_string())
                .collect::<Vec<String>>()
                .join(" ")
        })
        .collect();
    format!("({})", positions.join(", "))
}
