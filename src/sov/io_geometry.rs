// Reading the precinct boundaries (a GeoJSON feature collection).

use std::fs;

use precinct_results::{Geometry, PrecinctId};
use serde::Deserialize;
use serde_json::{Map, Value as JSValue};

use crate::sov::*;

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Map<String, JSValue>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

pub fn read_boundaries(path: &str, id_property: &str) -> SovResult<Vec<(PrecinctId, Geometry)>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_boundaries: read {:?}", path);
    parse_boundaries(&contents, path, id_property)
}

/// The boundary of each feature, keyed by the precinct named in the
/// `id_property` property. Numeric identifiers are converted to strings.
pub fn parse_boundaries(
    contents: &str,
    path: &str,
    id_property: &str,
) -> SovResult<Vec<(PrecinctId, Geometry)>> {
    let fc: FeatureCollection =
        serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    let mut res: Vec<(PrecinctId, Geometry)> = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.into_iter().enumerate() {
        let precinct_id = match feature.properties.get(id_property) {
            Some(JSValue::String(s)) => s.clone(),
            Some(JSValue::Number(n)) => n.to_string(),
            _ => {
                return MissingGeometryIdSnafu {
                    path,
                    index,
                    property: id_property,
                }
                .fail()
            }
        };
        debug!(
            "parse_boundaries: precinct {}: {}",
            precinct_id, feature.geometry.kind
        );
        res.push((precinct_id, feature.geometry));
    }
    Ok(res)
}
