use std::path::Path;
use std::{fs, io};

use anyhow::anyhow;

use crate::layer::feature::{features_from_json, features_to_collection, Feature};

pub fn write_features_to_geojson(features: &[Feature], output_filepath: &Path) -> io::Result<()> {
    let geojson_contents = geojson::GeoJson::from(features_to_collection(features));
    fs::write(output_filepath, geojson_contents.to_string())
}

pub fn read_features_from_geojson(filepath: &Path) -> anyhow::Result<Vec<Feature>> {
    let contents = fs::read_to_string(filepath)?;
    Ok(features_from_json(&contents)?)
}

/// Read the geometry of the first feature in a GeoJSON file, e.g. to use as a spatial filter.
pub fn read_geometry_from_geojson(filepath: &Path) -> anyhow::Result<geo::Geometry> {
    let features = read_features_from_geojson(filepath)?;
    let num_features = features.len();
    let geometry = features
        .into_iter()
        .find_map(|feature| feature.geometry)
        .ok_or_else(|| anyhow!("No geometry found in {:?}", filepath))?;
    if num_features > 1 {
        log::warn!(
            "Found {} features in {:?}, only the first geometry is used.",
            num_features,
            filepath
        );
    }
    Ok(geometry)
}
