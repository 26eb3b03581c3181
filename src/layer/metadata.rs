use geojson::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// A custom attribute column of a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Server-defined metadata such as length or default value, passed through untouched.
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl LayerField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            extra: JsonObject::new(),
        }
    }
}

/// Identity and schema of a layer, copied once when a client is constructed.
///
/// The snapshot is never refreshed. Changes made to the layer through another client are only
/// visible after constructing a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadataSnapshot {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fields: Vec<LayerField>,
    #[serde(default)]
    source: Option<JsonValue>,
    #[serde(default, rename = "type")]
    layer_type: Option<String>,
    #[serde(default)]
    symbol_config: Option<JsonValue>,
}

impl LayerMetadataSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            fields: Vec::new(),
            source: None,
            layer_type: None,
            symbol_config: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &[LayerField] {
        &self.fields
    }

    pub fn source(&self) -> Option<&JsonValue> {
        self.source.as_ref()
    }

    pub fn layer_type(&self) -> Option<&str> {
        self.layer_type.as_deref()
    }

    pub fn symbol_config(&self) -> Option<&JsonValue> {
        self.symbol_config.as_ref()
    }
}
