use anyhow::anyhow;
use clap::{Args as ClapArgs, Parser, Subcommand};
use maplayer::geofile::geojson::read_features_from_geojson;
use maplayer::geofile::geojson::read_geometry_from_geojson;
use maplayer::geofile::geojson::write_features_to_geojson;
use maplayer::layer::feature::features_to_collection;
use maplayer::{ConnectionConfig, FeatureLayer, HttpTransport, LayerResult};
use maplayer::{CoordinateType, QueryFilter, SpatialFilter, SpatialRelation};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize, Debug)]
struct Config {
    base_url: String,
    layer_id: String,
    #[serde(default)]
    use_gzip: bool,
    timeout_secs: Option<u64>,
}

impl Config {
    fn load(filepath: &Path) -> anyhow::Result<Self> {
        if !filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", filepath));
        }
        let config_contents = read_to_string(filepath)?;
        Ok(serde_yaml::from_str(&config_contents)?)
    }

    fn connection(&self) -> LayerResult<ConnectionConfig> {
        let connection = ConnectionConfig::new(&self.base_url)?.with_gzip(self.use_gzip);
        Ok(match self.timeout_secs {
            Some(secs) => connection.with_timeout(Duration::from_secs(secs)),
            None => connection,
        })
    }
}

/// Manage and query the features of a remote map layer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the layer metadata.
    Info,
    /// List the custom fields of the layer.
    Fields,
    /// Query features, printing them as GeoJSON or writing them to a file.
    Query {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 0)]
        page: i32,
        #[arg(long, default_value_t = 100)]
        count: i32,
        /// Write the result to this GeoJSON file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Query only the properties of features.
    QueryProperties {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 0)]
        page: i32,
        #[arg(long, default_value_t = 100)]
        count: i32,
    },
    /// Count the features matching a filter.
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Add the features of a GeoJSON file.
    Add { geojson_filepath: PathBuf },
    /// Remove the features matching a condition.
    Remove {
        #[arg(long)]
        condition: String,
    },
    /// Remove every feature of the layer.
    RemoveAll,
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// Attribute condition, e.g. "status = 'open'".
    #[arg(long)]
    condition: Option<String>,
    /// Comma separated list of fields to return.
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,
    #[arg(long)]
    coordinate_type: Option<CoordinateType>,
    #[arg(long)]
    with_symbol: bool,
    /// GeoJSON file whose first geometry must intersect the results.
    #[arg(long)]
    spatial_filter: Option<PathBuf>,
}

impl FilterArgs {
    fn to_query_filter(&self) -> anyhow::Result<QueryFilter> {
        let spatial_filter = match &self.spatial_filter {
            Some(filepath) => Some(SpatialFilter::new(
                read_geometry_from_geojson(filepath)?,
                SpatialRelation::Intersects,
            )),
            None => None,
        };
        Ok(QueryFilter {
            condition: self.condition.clone(),
            spatial_filter,
            coordinate_type: self.coordinate_type.clone(),
            with_symbol: self.with_symbol,
            result_fields: self.fields.clone(),
        })
    }
}

fn run_command(layer: &FeatureLayer, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info => println!("{}", serde_json::to_string_pretty(layer.metadata())?),
        Command::Fields => match layer.get_layer_fields()? {
            Some(fields) => println!("{}", serde_json::to_string_pretty(&fields)?),
            None => log::info!("Layer {} has no custom fields", layer.id()),
        },
        Command::Query {
            filter,
            page,
            count,
            output,
        } => {
            let filter = filter.to_query_filter()?;
            match (layer.query(Some(&filter), page, count)?, output) {
                (Some(features), Some(output_filepath)) => {
                    log::info!(
                        "Writing {} features to {:?}",
                        features.len(),
                        output_filepath
                    );
                    write_features_to_geojson(&features, &output_filepath)?;
                }
                (Some(features), None) => println!(
                    "{}",
                    geojson::GeoJson::from(features_to_collection(&features))
                ),
                (None, _) => log::info!("No response for page {} with count {}", page, count),
            }
        }
        Command::QueryProperties {
            filter,
            page,
            count,
        } => {
            let filter = filter.to_query_filter()?;
            match layer.query_properties(Some(&filter), page, count)? {
                Some(json) => println!("{}", json),
                None => log::info!("No response for page {} with count {}", page, count),
            }
        }
        Command::Count { filter } => {
            println!("{}", layer.count(Some(&filter.to_query_filter()?))?)
        }
        Command::Add { geojson_filepath } => {
            let features = read_features_from_geojson(&geojson_filepath)?;
            log::info!("Adding {} features to layer {}", features.len(), layer.id());
            layer.add_all(Some(features.as_slice()))?;
        }
        Command::Remove { condition } => layer.remove(&condition)?,
        Command::RemoveAll => {
            log::info!("Removing all features of layer {}", layer.id());
            layer.remove_all()?;
        }
    }
    Ok(())
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = Config::load(&args.config_filepath)?;
    let connection = config.connection()?;
    let transport = Arc::new(HttpTransport::new(&connection)?);

    log::info!("Opening layer {} at {}", config.layer_id, connection.base_url());
    let layer = FeatureLayer::open(&config.layer_id, connection, transport)?;
    run_command(&layer, args.command)
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use testdir::testdir;

    use super::*;

    #[rstest]
    fn test_load_config_from_yaml() {
        let test_dir = testdir!();
        let config_filepath = test_dir.join("config.yaml");
        fs::write(
            &config_filepath,
            "base_url: http://localhost:8080/maptalks/rest\nlayer_id: roads\nuse_gzip: true\ntimeout_secs: 30\n",
        )
        .unwrap();

        let config = Config::load(&config_filepath).unwrap();
        assert_eq!(config.layer_id, "roads");

        let connection = config.connection().unwrap();
        assert!(connection.use_gzip());
        assert_eq!(connection.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            connection.base_url().as_str(),
            "http://localhost:8080/maptalks/rest/"
        );
    }

    #[rstest]
    fn test_gzip_defaults_to_off() {
        let test_dir = testdir!();
        let config_filepath = test_dir.join("config.yaml");
        fs::write(&config_filepath, "base_url: http://localhost/\nlayer_id: roads\n").unwrap();

        let connection = Config::load(&config_filepath).unwrap().connection().unwrap();
        assert!(!connection.use_gzip());
        assert_eq!(connection.timeout(), None);
    }

    #[rstest]
    fn test_missing_config_file() {
        let test_dir = testdir!();
        assert!(Config::load(&test_dir.join("missing.yaml")).is_err());
    }
}
