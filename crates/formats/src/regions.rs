use std::collections::HashMap;

use foundation::math::Crs;
use serde_json::{Map, Value};

use crate::boundary::{Boundary, GeometryError, boundary_features_from_geojson_str};

pub const PROP_CODE: &str = "code";
pub const PROP_NAME: &str = "naam";
pub const PROP_PROVINCE: &str = "ligtInProvincieNaam";

/// One administrative region (gemeente) of the static dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub code: String,
    pub name: String,
    pub province: String,
    /// Boundary in the dataset's storage CRS.
    pub boundary: Boundary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    Geometry(GeometryError),
    MissingProperty { index: usize, key: &'static str },
    DuplicateCode { code: String, first: usize, second: usize },
    Io(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Geometry(e) => write!(f, "{e}"),
            DatasetError::MissingProperty { index, key } => {
                write!(f, "feature {index} has no string property `{key}`")
            }
            DatasetError::DuplicateCode {
                code,
                first,
                second,
            } => write!(f, "region code {code} used by features {first} and {second}"),
            DatasetError::Io(msg) => write!(f, "dataset read error: {msg}"),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<GeometryError> for DatasetError {
    fn from(e: GeometryError) -> Self {
        DatasetError::Geometry(e)
    }
}

/// Read-only region catalog, indexed by code.
///
/// Codes are unique; a dataset with duplicates is rejected at load time rather than
/// resolved by picking one of the matches.
#[derive(Debug, Clone)]
pub struct RegionDataset {
    crs: Crs,
    records: Vec<RegionRecord>,
    by_code: HashMap<String, usize>,
}

impl RegionDataset {
    /// Parses a GeoJSON FeatureCollection in EPSG:4326.
    pub fn from_geojson_str(payload: &str) -> Result<Self, DatasetError> {
        let features = boundary_features_from_geojson_str(payload)?;
        let mut records = Vec::with_capacity(features.len());
        for (index, feature) in features.into_iter().enumerate() {
            records.push(RegionRecord {
                code: string_property(&feature.properties, index, PROP_CODE)?,
                name: string_property(&feature.properties, index, PROP_NAME)?,
                province: string_property(&feature.properties, index, PROP_PROVINCE)?,
                boundary: feature.boundary,
            });
        }
        Self::from_records(Crs::Epsg4326, records)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::Io(format!("read {path:?}: {e}")))?;
        Self::from_geojson_str(&payload)
    }

    pub fn from_records(crs: Crs, records: Vec<RegionRecord>) -> Result<Self, DatasetError> {
        let mut by_code = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if let Some(first) = by_code.insert(record.code.clone(), index) {
                return Err(DatasetError::DuplicateCode {
                    code: record.code.clone(),
                    first,
                    second: index,
                });
            }
        }
        Ok(Self {
            crs,
            records,
            by_code,
        })
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionRecord> {
        self.records.iter()
    }

    pub fn get(&self, code: &str) -> Option<&RegionRecord> {
        self.by_code.get(code).map(|&i| &self.records[i])
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.code.as_str())
    }

    /// Records ordered by display name. The dataset itself is left untouched.
    pub fn sorted_by_name(&self) -> Vec<&RegionRecord> {
        let mut out: Vec<&RegionRecord> = self.records.iter().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

fn string_property(
    props: &Map<String, Value>,
    index: usize,
    key: &'static str,
) -> Result<String, DatasetError> {
    props
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(DatasetError::MissingProperty { index, key })
}
