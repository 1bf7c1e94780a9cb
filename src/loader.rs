//! Reading the community boundary GeoJSON and the mode-of-travel CSV.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::aggregate::{CountPolicy, RawTable, aggregate};
use crate::atlas::Atlas;
use crate::error::LoadError;
use crate::fetch::{HttpClient, fetch_bytes, is_remote};

/// Closed ring of `[longitude, latitude]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Exterior ring first, then holes.
pub type Polygon = Vec<Ring>;

/// One community outline from the boundary file.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub comm_code: String,
    pub name: String,
    pub sector: Option<String>,
    pub polygons: Vec<Polygon>,
}

impl Boundary {
    pub fn positions(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.polygons.iter().flatten().flatten().copied()
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

fn property(props: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    let value = match props.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

fn to_ring(raw: Vec<Vec<f64>>) -> Option<Ring> {
    raw.into_iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] => Some([*lon, *lat]),
            _ => None,
        })
        .collect()
}

fn to_polygons(geometry: Geometry) -> Option<Vec<Polygon>> {
    let rings = |raw: Vec<Vec<Vec<f64>>>| raw.into_iter().map(to_ring).collect::<Option<Polygon>>();
    match geometry.kind.as_str() {
        "Polygon" => {
            let raw: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates).ok()?;
            Some(vec![rings(raw)?])
        }
        "MultiPolygon" => {
            let raw: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(geometry.coordinates).ok()?;
            raw.into_iter().map(rings).collect()
        }
        _ => None,
    }
}

/// Decodes a GeoJSON `FeatureCollection` into boundaries.
///
/// Features without a `comm_code` property or without polygonal geometry are
/// skipped with a warning.
pub fn parse_boundaries(bytes: &[u8], source_name: &str) -> Result<Vec<Boundary>, LoadError> {
    let collection: FeatureCollection =
        serde_json::from_slice(bytes).map_err(|error| LoadError::GeoJson {
            source_name: source_name.to_string(),
            error,
        })?;

    if collection.kind != "FeatureCollection" {
        return Err(LoadError::NotFeatureCollection {
            source_name: source_name.to_string(),
            found: collection.kind,
        });
    }

    let mut boundaries = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.unwrap_or_default();
        let Some(comm_code) = property(&props, "comm_code") else {
            warn!(feature = i, "Feature has no comm_code, skipping");
            continue;
        };
        let Some(polygons) = feature.geometry.and_then(to_polygons) else {
            warn!(feature = i, comm_code = %comm_code, "Feature has no polygon geometry, skipping");
            continue;
        };

        boundaries.push(Boundary {
            name: property(&props, "name").unwrap_or_else(|| comm_code.clone()),
            sector: property(&props, "sector"),
            comm_code,
            polygons,
        });
    }

    debug!(count = boundaries.len(), "Boundaries parsed");
    Ok(boundaries)
}

/// Reads the delimited mode-of-travel file into string cells.
pub fn parse_table(bytes: &[u8], source_name: &str) -> Result<RawTable, LoadError> {
    let csv_error = |error| LoadError::Csv {
        source_name: source_name.to_string(),
        error,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(rows = rows.len(), "Table parsed");
    Ok(RawTable { headers, rows })
}

/// Loads a source from a local path or over HTTP.
#[tracing::instrument(skip(client))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>, LoadError> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source)
            .await
            .map_err(|error| LoadError::Fetch {
                source_name: source.to_string(),
                error,
            })?
    } else {
        tokio::fs::read(source)
            .await
            .map_err(|error| LoadError::Io {
                source_name: source.to_string(),
                error,
            })?
    };
    debug!(bytes = bytes.len(), "Source read");
    Ok(bytes)
}

/// Reads both sources concurrently, aggregates the table and joins it to the
/// boundaries. Either load failing is fatal.
#[tracing::instrument(skip(client, policy))]
pub async fn load_atlas<C: HttpClient>(
    client: &C,
    boundaries: &str,
    table: &str,
    policy: CountPolicy,
) -> anyhow::Result<Atlas> {
    let (boundary_bytes, table_bytes) =
        tokio::try_join!(read_source(client, boundaries), read_source(client, table))?;

    let boundaries = parse_boundaries(&boundary_bytes, boundaries)?;
    let table = parse_table(&table_bytes, table)?;
    let dataset = aggregate(&table, policy)?;
    let atlas = Atlas::join(boundaries, dataset)?;

    info!(
        communities = atlas.boundaries().len(),
        with_data = atlas.dataset().len(),
        missing_rows = atlas.report().missing_rows.len(),
        orphan_rows = atlas.report().orphan_rows.len(),
        "Atlas loaded"
    );
    Ok(atlas)
}
