use geojson::{JsonObject, JsonValue};
use serde::{Serialize, Serializer};

use super::feature::Feature;
use super::filter::{QueryFilter, SpatialFilter};
use super::metadata::LayerField;
use crate::error::LayerResult;

/// Values that can be sent as the `data` payload of a request.
///
/// `Ok(None)` means there is no payload, which callers treat differently from the JSON text
/// `null`. Strings are considered already encoded and are passed through unchanged.
pub trait ToPayload {
    fn to_payload(&self) -> LayerResult<Option<String>>;
}

pub fn encode<P: ToPayload + ?Sized>(value: &P) -> LayerResult<Option<String>> {
    value.to_payload()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> LayerResult<Option<String>> {
    Ok(Some(serde_json::to_string(value)?))
}

impl ToPayload for str {
    fn to_payload(&self) -> LayerResult<Option<String>> {
        Ok(Some(self.to_string()))
    }
}

impl ToPayload for String {
    fn to_payload(&self) -> LayerResult<Option<String>> {
        self.as_str().to_payload()
    }
}

impl ToPayload for JsonValue {
    fn to_payload(&self) -> LayerResult<Option<String>> {
        match self {
            JsonValue::Null => Ok(None),
            JsonValue::String(value) => value.to_payload(),
            value => to_json(value),
        }
    }
}

impl<P: ToPayload> ToPayload for Option<P> {
    fn to_payload(&self) -> LayerResult<Option<String>> {
        match self {
            Some(value) => value.to_payload(),
            None => Ok(None),
        }
    }
}

impl<P: ToPayload + ?Sized> ToPayload for &P {
    fn to_payload(&self) -> LayerResult<Option<String>> {
        (**self).to_payload()
    }
}

macro_rules! json_payload {
    ($($ty:ty),*) => {
        $(
            impl ToPayload for $ty {
                fn to_payload(&self) -> LayerResult<Option<String>> {
                    to_json(self)
                }
            }
        )*
    };
}

json_payload!(
    Feature,
    [Feature],
    Vec<Feature>,
    SpatialFilter,
    QueryFilter,
    LayerField,
    JsonObject
);

/// Serialize a geometry as its GeoJSON object, or `null` when absent.
pub(crate) fn serialize_geometry<S: Serializer>(
    geometry: &Option<geo::Geometry>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    geometry
        .as_ref()
        .map(|geometry| geojson::Geometry::new(geojson::Value::from(geometry)))
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::layer::filter::SpatialRelation;

    fn square() -> geo::Geometry {
        geo::Geometry::Polygon(geo::Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        ))
    }

    #[rstest]
    #[case("status='closed'")]
    #[case(r#"{"already": "encoded"}"#)]
    #[case("")]
    fn test_strings_pass_through(#[case] value: &str) {
        assert_eq!(encode(value).unwrap().as_deref(), Some(value));
    }

    #[rstest]
    fn test_null_has_no_payload() {
        assert_eq!(encode(&JsonValue::Null).unwrap(), None);
        assert_eq!(encode(&Option::<Feature>::None).unwrap(), None);
    }

    #[rstest]
    fn test_property_bag_is_json() {
        let properties = json!({"status": "closed", "lanes": 2});
        let encoded = encode(&properties).unwrap().unwrap();
        let decoded: JsonValue = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, properties);
    }

    #[rstest]
    fn test_feature_list_is_json_array() {
        let features = vec![
            Feature::new(geo::Geometry::Point(geo::Point::new(1.0, 2.0))),
            Feature::new(geo::Geometry::Point(geo::Point::new(3.0, 4.0))),
        ];
        let encoded = encode(&features).unwrap().unwrap();
        let decoded: JsonValue = serde_json::from_str(&encoded).unwrap();
        let decoded = decoded.as_array().unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1]["geometry"]["coordinates"], json!([3.0, 4.0]));
    }

    #[rstest]
    fn test_spatial_filter_keeps_geometry() {
        let filter = SpatialFilter::new(square(), SpatialRelation::Contains).with_buffer(5.0);
        let encoded = encode(&filter).unwrap().unwrap();
        let decoded: JsonValue = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded["geometry"]["type"], "Polygon");
        assert_eq!(
            decoded["geometry"]["coordinates"],
            json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]])
        );
        assert_eq!(decoded["relation"], 1);
        assert_eq!(decoded["buffer"], 5.0);

        let geometry: geojson::Geometry =
            serde_json::from_value(decoded["geometry"].clone()).unwrap();
        assert_eq!(geo::Geometry::try_from(geometry.value).unwrap(), square());
    }

    #[rstest]
    fn test_query_filter_is_json() {
        let filter = QueryFilter::new()
            .with_condition("lanes > 2")
            .with_result_fields(["name", "lanes"]);
        let decoded: JsonValue =
            serde_json::from_str(&encode(&filter).unwrap().unwrap()).unwrap();
        assert_eq!(
            decoded,
            json!({"condition": "lanes > 2", "withSymbol": false, "resultFields": ["name", "lanes"]})
        );
    }
}
