use std::sync::Arc;

use url::Url;

use super::codec::{encode, ToPayload};
use super::feature::{features_from_json, Feature};
use super::filter::QueryFilter;
use super::metadata::{LayerField, LayerMetadataSnapshot};
use super::params::build_parameters;
use crate::config::ConnectionConfig;
use crate::error::{invalid_argument, LayerError, LayerResult};
use crate::transport::{FormParams, Request, Transport};

const DATA: &str = "data";
const CONDITION: &str = "condition";
const PAGE: &str = "page";
const COUNT: &str = "count";

/// Client for the features and schema of a single remote layer.
///
/// Holds no mutable state: the metadata snapshot, connection config and transport are fixed at
/// construction, so one client may be shared between threads.
pub struct FeatureLayer {
    metadata: LayerMetadataSnapshot,
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
}

impl FeatureLayer {
    pub fn new(
        metadata: LayerMetadataSnapshot,
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            metadata,
            config,
            transport,
        }
    }

    /// Look up the layer's metadata and construct a client for it.
    pub fn open(
        layer_id: &str,
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> LayerResult<Self> {
        let mut url = config.base_url().clone();
        push_segments(&mut url, &["layers", layer_id])?;
        log::debug!("Looking up layer {}", layer_id);
        let body = transport.execute(&Request::get(url, config.use_gzip()))?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Err(LayerError::InvalidLayer(format!(
                "there is no layer with identifier: {layer_id}"
            )));
        }
        let metadata: LayerMetadataSnapshot = serde_json::from_str(body)?;
        Ok(Self::new(metadata, config, transport))
    }

    pub fn metadata(&self) -> &LayerMetadataSnapshot {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        self.metadata.id()
    }

    pub fn add_layer_field(&self, field: &LayerField) -> LayerResult<()> {
        let url = self.resource_url(&["fields"], Some("create"))?;
        self.post_request(url, encode(field)?)?;
        Ok(())
    }

    /// Replace the definition of the field named `field_name`. Does nothing for a blank name.
    pub fn update_layer_field(&self, field_name: &str, field: &LayerField) -> LayerResult<()> {
        if field_name.trim().is_empty() {
            log::debug!("Skipping field update without a field name");
            return Ok(());
        }
        let url = self.resource_url(&["fields", field_name], Some("update"))?;
        self.post_request(url, encode(field)?)?;
        Ok(())
    }

    /// Remove a field. Some backing stores refuse this, e.g. while the column holds data, in
    /// which case the server's error is returned. Does nothing for a blank name.
    pub fn remove_layer_field(&self, field_name: &str) -> LayerResult<()> {
        if field_name.trim().is_empty() {
            log::debug!("Skipping field removal without a field name");
            return Ok(());
        }
        let url = self.resource_url(&["fields", field_name], Some("remove"))?;
        self.execute(Request::post(url, None, self.config.use_gzip()))?;
        Ok(())
    }

    /// Custom fields of the layer as currently stored on the server, `None` when there are none.
    pub fn get_layer_fields(&self) -> LayerResult<Option<Vec<LayerField>>> {
        let url = self.resource_url(&["fields"], None)?;
        let body = self.execute(Request::get(url, self.config.use_gzip()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let fields: Option<Vec<LayerField>> = serde_json::from_str(&body)?;
        Ok(fields.filter(|fields| !fields.is_empty()))
    }

    /// Create a feature. Features without a geometry are sent as they are.
    pub fn add(&self, feature: Option<&Feature>) -> LayerResult<()> {
        let Some(feature) = feature else {
            return Err(invalid_argument("Geometry is null"));
        };
        let url = self.resource_url(&["data"], Some("create"))?;
        self.post_request(url, encode(feature)?)?;
        Ok(())
    }

    /// Create features in one request. An empty list is sent as `[]`.
    pub fn add_all(&self, features: Option<&[Feature]>) -> LayerResult<()> {
        let Some(features) = features else {
            return Err(invalid_argument("Geometry is null"));
        };
        let url = self.resource_url(&["data"], Some("create"))?;
        self.post_request(url, encode(features)?)?;
        Ok(())
    }

    /// Update the features matching `condition` with `feature`, which must carry an identifier.
    /// Without a condition the server matches by identifier.
    pub fn update(&self, condition: Option<&str>, feature: &Feature) -> LayerResult<()> {
        if feature.id.is_none() {
            return Err(invalid_argument("Geometry identifier is null"));
        }
        let url = self.resource_url(&["data"], Some("update"))?;
        let mut params = FormParams::new();
        if let Some(data) = encode(feature)? {
            params.insert(DATA.to_string(), data);
        }
        if let Some(condition) = condition {
            params.insert(CONDITION.to_string(), condition.to_string());
        }
        self.execute(Request::post(url, Some(params), self.config.use_gzip()))?;
        Ok(())
    }

    /// Remove the features matching `condition`. A blank condition issues no request.
    pub fn remove(&self, condition: &str) -> LayerResult<()> {
        if condition.trim().is_empty() {
            log::debug!("Skipping remove with a blank condition");
            return Ok(());
        }
        let url = self.resource_url(&["data"], Some("remove"))?;
        let params = FormParams::from([(CONDITION.to_string(), condition.to_string())]);
        self.execute(Request::post(url, Some(params), self.config.use_gzip()))?;
        Ok(())
    }

    pub fn remove_all(&self) -> LayerResult<()> {
        let url = self.resource_url(&["data"], Some("removeAll"))?;
        self.post_request(url, None)?;
        Ok(())
    }

    /// Overwrite properties of the features matching `condition`. Properties that encode to no
    /// payload, such as `null`, issue no request.
    pub fn update_properties<P: ToPayload + ?Sized>(
        &self,
        condition: Option<&str>,
        properties: &P,
    ) -> LayerResult<()> {
        let Some(data) = encode(properties)? else {
            log::debug!("Skipping property update without properties");
            return Ok(());
        };
        let url = self.resource_url(&["data"], Some("update"))?;
        let mut params = FormParams::from([(DATA.to_string(), data)]);
        if let Some(condition) = condition {
            params.insert(CONDITION.to_string(), condition.to_string());
        }
        self.execute(Request::post(url, Some(params), self.config.use_gzip()))?;
        Ok(())
    }

    /// Query a page of features. Returns `None` without a request when `page` is negative or
    /// `count` is not positive, and `None` when the server answers with an empty body.
    pub fn query(
        &self,
        filter: Option<&QueryFilter>,
        page: i32,
        count: i32,
    ) -> LayerResult<Option<Vec<Feature>>> {
        match self.query_json(filter, page, count)? {
            Some(json) if !json.trim().is_empty() => Ok(Some(features_from_json(&json)?)),
            _ => Ok(None),
        }
    }

    /// Same request as [`FeatureLayer::query`], returning the response document unparsed.
    pub fn query_json(
        &self,
        filter: Option<&QueryFilter>,
        page: i32,
        count: i32,
    ) -> LayerResult<Option<String>> {
        self.paged_query("query", filter, page, count)
    }

    /// Query only the properties of a page of features, returning the response document
    /// unparsed.
    pub fn query_properties(
        &self,
        filter: Option<&QueryFilter>,
        page: i32,
        count: i32,
    ) -> LayerResult<Option<String>> {
        self.paged_query("queryAttributes", filter, page, count)
    }

    /// Number of features matching `filter`.
    pub fn count(&self, filter: Option<&QueryFilter>) -> LayerResult<i64> {
        let url = self.resource_url(&["data"], Some("count"))?;
        let params = build_parameters(filter)?;
        let body = self.execute(Request::post(url, Some(params), self.config.use_gzip()))?;
        Ok(body.trim().parse::<i64>()?)
    }

    fn paged_query(
        &self,
        op: &str,
        filter: Option<&QueryFilter>,
        page: i32,
        count: i32,
    ) -> LayerResult<Option<String>> {
        if page < 0 || count <= 0 {
            log::debug!("Skipping {} for page {} with count {}", op, page, count);
            return Ok(None);
        }
        let url = self.resource_url(&["data"], Some(op))?;
        let mut params = build_parameters(filter)?;
        params.insert(PAGE.to_string(), page.to_string());
        params.insert(COUNT.to_string(), count.to_string());
        let body = self.execute(Request::post(url, Some(params), self.config.use_gzip()))?;
        Ok(Some(body))
    }

    fn post_request(&self, url: Url, data: Option<String>) -> LayerResult<String> {
        let params = data.map(|data| FormParams::from([(DATA.to_string(), data)]));
        self.execute(Request::post(url, params, self.config.use_gzip()))
    }

    fn execute(&self, request: Request) -> LayerResult<String> {
        log::debug!("{:?} {}", request.method, request.url);
        self.transport.execute(&request)
    }

    /// `{base}/layers/{id}/{segments..}?op={op}`
    fn resource_url(&self, segments: &[&str], op: Option<&str>) -> LayerResult<Url> {
        let mut url = self.config.base_url().clone();
        push_segments(&mut url, &["layers", self.id()])?;
        push_segments(&mut url, segments)?;
        if let Some(op) = op {
            url.query_pairs_mut().append_pair("op", op);
        }
        Ok(url)
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> LayerResult<()> {
    url.path_segments_mut()
        .map_err(|_| LayerError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}
