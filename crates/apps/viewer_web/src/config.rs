use layers::WmtsSource;
use serde::{Deserialize, Serialize};

/// Ids of the page elements the viewer drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub map: String,
    pub title: String,
    pub error: String,
    pub error_message: String,
    /// Generated on the first failed load.
    pub search_input: String,
    pub search_list: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            map: "map".to_string(),
            title: "title".to_string(),
            error: "error".to_string(),
            error_message: "errorMessage".to_string(),
            search_input: "input-gemeenten".to_string(),
            search_list: "gemeenten".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub elements: ElementIds,
    /// Fragment key holding the region code.
    pub selection_key: String,
    pub home_marker: String,
    /// Fraction of each viewport dimension kept clear around a fitted region.
    pub padding_ratio: f64,
    pub initial_center_lon_lat: [f64; 2],
    pub initial_zoom: f64,
    pub base_layer: WmtsSource,
    pub aerial_layer: WmtsSource,
    pub dataset_url: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            elements: ElementIds::default(),
            selection_key: runtime::SELECTION_KEY.to_string(),
            home_marker: runtime::HOME_MARKER.to_string(),
            padding_ratio: 0.05,
            initial_center_lon_lat: [5.417633, 52.152916],
            initial_zoom: 8.0,
            base_layer: WmtsSource::pdok_brt_grijs(),
            aerial_layer: WmtsSource::pdok_luchtfoto_2020(),
            dataset_url: "data/gemeenten-simple-4326.json".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
