use geojson::feature::Id;
use geojson::{GeoJson, JsonObject, JsonValue};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::error::{LayerError, LayerResult};

/// A geometry with its properties, as stored in a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    /// Required for updates, optional for creation where the server may assign one.
    pub id: Option<Id>,
    pub geometry: Option<geo::Geometry>,
    pub properties: Option<JsonObject>,
    /// Rendering symbol, only present in query results requested with a symbol.
    pub symbol: Option<JsonValue>,
}

impl Feature {
    pub fn new(geometry: geo::Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: Id) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties
            .get_or_insert_with(JsonObject::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&JsonValue> {
        self.properties.as_ref().and_then(|properties| properties.get(key))
    }
}

impl From<geo::Geometry> for Feature {
    fn from(value: geo::Geometry) -> Self {
        Self::new(value)
    }
}

impl From<&Feature> for geojson::Feature {
    fn from(feature: &Feature) -> Self {
        let foreign_members = feature.symbol.as_ref().map(|symbol| {
            let mut members = JsonObject::new();
            members.insert("symbol".to_string(), symbol.clone());
            members
        });
        geojson::Feature {
            bbox: None,
            geometry: feature
                .geometry
                .as_ref()
                .map(|geometry| geojson::Geometry::new(geojson::Value::from(geometry))),
            id: feature.id.clone(),
            properties: feature.properties.clone(),
            foreign_members,
        }
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = LayerError;

    fn try_from(feature: geojson::Feature) -> LayerResult<Self> {
        let geometry = match feature.geometry {
            Some(geometry) => Some(geo::Geometry::try_from(geometry.value)?),
            None => None,
        };
        let symbol = feature
            .foreign_members
            .and_then(|mut members| members.remove("symbol"));
        Ok(Self {
            id: feature.id,
            geometry,
            properties: feature.properties,
            symbol,
        })
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        geojson::Feature::from(self).serialize(serializer)
    }
}

/// Parse features from a document holding a FeatureCollection, a single Feature or a bare array
/// of features.
pub fn features_from_json(json: &str) -> LayerResult<Vec<Feature>> {
    let value: JsonValue = serde_json::from_str(json)?;
    let features: Vec<geojson::Feature> = match value {
        JsonValue::Array(values) => values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?,
        value => match serde_json::from_value::<GeoJson>(value)? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
        },
    };
    features.into_par_iter().map(Feature::try_from).collect()
}

/// Build a FeatureCollection document from features.
pub fn features_to_collection(features: &[Feature]) -> geojson::FeatureCollection {
    features.iter().map(geojson::Feature::from).collect()
}
