use foundation::Aabb2;
use foundation::math::Crs;
use serde_json::{Map, Value};

/// Closed ring of `[x, y]` coordinates. The closing duplicate point is kept as read.
pub type Ring = Vec<[f64; 2]>;

/// One outer ring followed by zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// Area geometry of a region: a GeoJSON `Polygon` (one part) or `MultiPolygon`.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub polygons: Vec<Polygon>,
}

impl Boundary {
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_points(self.points())
    }

    pub fn points(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.polygons
            .iter()
            .flat_map(|poly| poly.rings.iter())
            .flat_map(|ring| ring.iter().copied())
    }

    pub fn point_count(&self) -> usize {
        self.points().count()
    }

    /// Copy of this boundary with every coordinate moved from `from` into `to`.
    pub fn reproject(&self, from: Crs, to: Crs) -> Boundary {
        if from == to {
            return self.clone();
        }
        let polygons = self
            .polygons
            .iter()
            .map(|poly| Polygon {
                rings: poly
                    .rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| from.transform(to, *p)).collect())
                    .collect(),
            })
            .collect();
        Boundary { polygons }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub boundary: Boundary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            GeometryError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeometryError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Reads the area features of a GeoJSON FeatureCollection.
pub fn boundary_features_from_geojson_str(
    payload: &str,
) -> Result<Vec<BoundaryFeature>, GeometryError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| GeometryError::Json(e.to_string()))?;
    boundary_features_from_geojson_value(&value)
}

pub fn boundary_features_from_geojson_value(
    value: &Value,
) -> Result<Vec<BoundaryFeature>, GeometryError> {
    let obj = value
        .as_object()
        .ok_or(GeometryError::NotAFeatureCollection)?;
    if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
        return Err(GeometryError::NotAFeatureCollection);
    }
    let features_val = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(GeometryError::NotAFeatureCollection)?;

    let mut out = Vec::with_capacity(features_val.len());
    for (index, feat_val) in features_val.iter().enumerate() {
        let invalid = |reason: String| GeometryError::InvalidFeature { index, reason };

        let feat_obj = feat_val
            .as_object()
            .ok_or_else(|| invalid("feature must be an object".to_string()))?;
        match feat_obj.get("type").and_then(|v| v.as_str()) {
            Some("Feature") => {}
            Some(other) => return Err(invalid(format!("unexpected feature type: {other}"))),
            None => return Err(invalid("feature missing type".to_string())),
        }

        let id = match feat_obj.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let properties = feat_obj
            .get("properties")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();
        let geometry_val = feat_obj
            .get("geometry")
            .ok_or_else(|| invalid("feature missing geometry".to_string()))?;
        let boundary = parse_boundary(geometry_val).map_err(invalid)?;

        out.push(BoundaryFeature {
            id,
            properties,
            boundary,
        });
    }
    Ok(out)
}

fn parse_boundary(value: &Value) -> Result<Boundary, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    let polygons = match ty {
        "Polygon" => vec![parse_polygon(coords)?],
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            polys.iter().map(parse_polygon).collect::<Result<_, _>>()?
        }
        other => return Err(format!("unsupported geometry type: {other}")),
    };
    if polygons.is_empty() {
        return Err("geometry has no polygons".to_string());
    }
    Ok(Boundary { polygons })
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let rings = rings.iter().map(parse_ring).collect::<Result<Vec<_>, _>>()?;
    match rings.first() {
        Some(outer) if outer.len() >= 3 => Ok(Polygon { rings }),
        Some(_) => Err("outer ring needs at least 3 positions".to_string()),
        None => Err("polygon has no rings".to_string()),
    }
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_position(value: &Value) -> Result<[f64; 2], String> {
    let arr = value
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [x, y]".to_string());
    }
    let x = arr[0]
        .as_f64()
        .ok_or("position x must be a number".to_string())?;
    let y = arr[1]
        .as_f64()
        .ok_or("position y must be a number".to_string())?;
    Ok([x, y])
}
