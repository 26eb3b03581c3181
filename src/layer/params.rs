use super::codec::encode;
use super::filter::QueryFilter;
use crate::error::LayerResult;
use crate::transport::FormParams;

pub const ATTRIBUTE_COND: &str = "attributeCond";
pub const SPATIAL_FILTER: &str = "spatialFilter";
pub const COORDINATE_TYPE: &str = "coordinateType";
pub const NEED_SYMBOL: &str = "needsymbol";
pub const FIELDS: &str = "fields";

/// Translate a query filter into request parameters.
///
/// A key is only present when the filter sets it: blank conditions, spatial filters without a
/// geometry, a false symbol flag and an absent field list all leave the server default in place.
/// Pagination parameters are added by the caller.
pub fn build_parameters(filter: Option<&QueryFilter>) -> LayerResult<FormParams> {
    let default_filter = QueryFilter::default();
    let filter = filter.unwrap_or(&default_filter);
    let mut params = FormParams::new();

    if let Some(condition) = &filter.condition {
        if !condition.trim().is_empty() {
            params.insert(ATTRIBUTE_COND.to_string(), condition.clone());
        }
    }
    if let Some(spatial_filter) = &filter.spatial_filter {
        if spatial_filter.is_present() {
            if let Some(encoded) = encode(spatial_filter)? {
                params.insert(SPATIAL_FILTER.to_string(), encoded);
            }
        }
    }
    if let Some(coordinate_type) = &filter.coordinate_type {
        params.insert(COORDINATE_TYPE.to_string(), coordinate_type.to_string());
    }
    if filter.with_symbol {
        params.insert(NEED_SYMBOL.to_string(), true.to_string());
    }
    if let Some(fields) = &filter.result_fields {
        params.insert(FIELDS.to_string(), fields.join(","));
    }
    Ok(params)
}
