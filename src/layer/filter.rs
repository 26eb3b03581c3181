use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::codec::serialize_geometry;

/// Relation a stored feature must have with the filter geometry to match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum SpatialRelation {
    #[default]
    Intersects,
    Contains,
    Disjoint,
    Overlaps,
    Touches,
    Within,
}

impl From<SpatialRelation> for u8 {
    fn from(relation: SpatialRelation) -> Self {
        match relation {
            SpatialRelation::Intersects => 0,
            SpatialRelation::Contains => 1,
            SpatialRelation::Disjoint => 2,
            SpatialRelation::Overlaps => 3,
            SpatialRelation::Touches => 4,
            SpatialRelation::Within => 5,
        }
    }
}

/// Spatial predicate of a query. Treated as absent unless it has a geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpatialFilter {
    #[serde(serialize_with = "serialize_geometry")]
    pub geometry: Option<geo::Geometry>,
    pub relation: SpatialRelation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<f64>,
}

impl SpatialFilter {
    pub fn new(geometry: geo::Geometry, relation: SpatialRelation) -> Self {
        Self {
            geometry: Some(geometry),
            relation,
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn is_present(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Coordinate system the server should return geometries in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinateType {
    Wgs84,
    Gcj02,
    Bd09ll,
    Cgcs2000,
    Pixel,
    Other(String),
}

impl fmt::Display for CoordinateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinateType::Wgs84 => "wgs84",
            CoordinateType::Gcj02 => "gcj02",
            CoordinateType::Bd09ll => "bd09ll",
            CoordinateType::Cgcs2000 => "cgcs2000",
            CoordinateType::Pixel => "pixel",
            CoordinateType::Other(name) => name,
        };
        f.write_str(name)
    }
}

impl FromStr for CoordinateType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "wgs84" => CoordinateType::Wgs84,
            "gcj02" => CoordinateType::Gcj02,
            "bd09ll" => CoordinateType::Bd09ll,
            "cgcs2000" => CoordinateType::Cgcs2000,
            "pixel" => CoordinateType::Pixel,
            _ => CoordinateType::Other(s.to_string()),
        })
    }
}

impl Serialize for CoordinateType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Attribute predicate, spatial predicate and result shaping of a query.
///
/// `QueryFilter::default()` matches every feature and returns every field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Opaque attribute predicate evaluated by the server, e.g. `status = 'open'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_filter: Option<SpatialFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_type: Option<CoordinateType>,
    pub with_symbol: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_fields: Option<Vec<String>>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_spatial_filter(mut self, spatial_filter: SpatialFilter) -> Self {
        self.spatial_filter = Some(spatial_filter);
        self
    }

    pub fn with_coordinate_type(mut self, coordinate_type: CoordinateType) -> Self {
        self.coordinate_type = Some(coordinate_type);
        self
    }

    pub fn with_symbol(mut self, with_symbol: bool) -> Self {
        self.with_symbol = with_symbol;
        self
    }

    pub fn with_result_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.result_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}
