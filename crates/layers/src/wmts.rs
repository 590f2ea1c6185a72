use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::tile_grid::{TileCoord, TileGrid};

// Everything outside the RFC 3986 unreserved set.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// KVP-addressed WMTS tile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmtsSource {
    pub url: String,
    pub layer: String,
    #[serde(default = "default_matrix_set")]
    pub matrix_set: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_matrix_set() -> String {
    "EPSG:3857".to_string()
}

fn default_format() -> String {
    "image/png".to_string()
}

fn default_style() -> String {
    "default".to_string()
}

impl WmtsSource {
    pub fn new(url: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layer: layer.into(),
            matrix_set: default_matrix_set(),
            format: default_format(),
            style: default_style(),
        }
    }

    /// PDOK BRT achtergrondkaart, grey variant.
    pub fn pdok_brt_grijs() -> Self {
        Self::new("https://service.pdok.nl/brt/achtergrondkaart/wmts/v2_0", "grijs")
    }

    /// PDOK aerial imagery, 2020 25 cm orthophoto.
    pub fn pdok_luchtfoto_2020() -> Self {
        Self::new("https://service.pdok.nl/hwh/luchtfotorgb/wmts/v1_0", "2020_ortho25")
    }

    pub fn tile_url(&self, grid: &TileGrid, coord: TileCoord) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        let matrix = grid.matrix_id(coord.z);
        format!(
            "{url}{sep}SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER={layer}&STYLE={style}\
             &FORMAT={format}&TILEMATRIXSET={set}&TILEMATRIX={matrix}&TILEROW={row}&TILECOL={col}",
            url = self.url,
            layer = utf8_percent_encode(&self.layer, QUERY_VALUE),
            style = utf8_percent_encode(&self.style, QUERY_VALUE),
            format = utf8_percent_encode(&self.format, QUERY_VALUE),
            set = utf8_percent_encode(&self.matrix_set, QUERY_VALUE),
            matrix = utf8_percent_encode(&matrix, QUERY_VALUE),
            row = coord.y,
            col = coord.x,
        )
    }
}
