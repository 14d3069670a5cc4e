//! County boundary file. Geometry is left to the map renderer; this module
//! only checks that county keys line up with the feature names.

use crate::error::{DashboardError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

pub fn read_boundaries(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| DashboardError::from_io(path, e))?;
    serde_json::from_str(&text).map_err(|source| DashboardError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Boundary file, or `None` (logged) when it is missing or malformed. The
/// map view shows a "not found" state in that case.
pub fn load_boundaries(path: &Path) -> Option<Value> {
    match read_boundaries(path) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("boundary file unavailable: {e}");
            None
        }
    }
}

/// `properties.<property>` of every feature that has a string value there.
pub fn feature_names(geojson: &Value, property: &str) -> BTreeSet<String> {
    geojson
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(|f| f.get("properties")?.get(property)?.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Map keys that have no matching feature.
pub fn counties_without_boundary<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    names: &BTreeSet<String>,
) -> Vec<&'a str> {
    keys.into_iter().filter(|k| !names.contains(*k)).collect()
}
