pub mod client;
pub mod codec;
pub mod feature;
pub mod filter;
pub mod metadata;
pub mod params;

pub use client::FeatureLayer;
pub use feature::Feature;
pub use filter::{CoordinateType, QueryFilter, SpatialFilter, SpatialRelation};
pub use metadata::{LayerField, LayerMetadataSnapshot};
