extern crate log;
pub mod config;
pub mod error;
pub mod geofile;
pub mod layer;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::ConnectionConfig;
pub use error::{ErrorCode, LayerError, LayerResult};
pub use layer::{
    CoordinateType, Feature, FeatureLayer, LayerField, LayerMetadataSnapshot, QueryFilter,
    SpatialFilter, SpatialRelation,
};
pub use transport::http::HttpTransport;
pub use transport::Transport;
