//! OSRM dataset preparation: download a Geofabrik extract and build the
//! MLD graph with the `osrm/osrm-backend` image.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::OsrmDataError;

const OSRM_IMAGE: &str = "osrm/osrm-backend";

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "africa/morocco".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The extract covering every city in the registry.
    pub fn morocco() -> Self {
        Self::new("africa/morocco")
    }

    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("region")
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
}

impl OsrmDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
        }
    }
}

/// Paths of a prepared dataset.
#[derive(Debug, Clone)]
pub struct OsrmDataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

impl OsrmDataset {
    /// Downloads and preprocesses the region unless the outputs already
    /// exist. Safe to call repeatedly.
    pub fn ensure(config: &OsrmDatasetConfig) -> Result<Self, OsrmDataError> {
        let name = config.region.name();
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(name);
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{}-latest.osm.pbf", name));
        if !pbf_path.exists() {
            tracing::info!(url = %config.region.url(), "downloading OSM extract");
            download(&config.region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", name));
        if !osrm_base.exists() {
            tracing::info!(region = name, "extracting road graph");
            run_osrm_tool(
                &["osrm-extract", "-p", "/opt/car.lua", &container_path(&pbf_path)],
                &data_dir,
            )?;
        }

        if !mld_ready(&osrm_base) {
            tracing::info!(region = name, "partitioning road graph");
            run_osrm_tool(&["osrm-partition", &container_path(&osrm_base)], &data_dir)?;
            run_osrm_tool(&["osrm-customize", &container_path(&osrm_base)], &data_dir)?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
            pbf_path,
        })
    }

    /// Path of the graph as seen from inside a container with `data_dir`
    /// mounted at `/data`.
    pub fn container_graph_path(&self) -> String {
        container_path(&self.osrm_base)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), OsrmDataError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_ready(osrm_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|extension| osrm_base.with_extension(extension).exists())
        && osrm_base.exists()
}

fn run_osrm_tool(args: &[&str], data_dir: &Path) -> Result<(), OsrmDataError> {
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg(OSRM_IMAGE)
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(OsrmDataError::ProcessFailure(format!(
            "{} exited with {}",
            args.first().copied().unwrap_or("docker"),
            status
        )))
    }
}

fn container_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    format!("/data/{}", file_name)
}
