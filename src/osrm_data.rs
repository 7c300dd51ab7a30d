//! OSRM dataset preparation helpers (download + preprocess).
//!
//! Fetches a Geofabrik extract and runs the MLD pipeline through the
//! `osrm/osrm-backend` docker image, so a local `osrm-routed` can serve the
//! `route` and `trip` services used by [`crate::osrm::OsrmClient`].

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "europe/monaco".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> String {
        self.path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("region")
            .to_string()
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

/// Travel profile baked into the extracted graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OsrmProfile {
    #[default]
    Car,
    Bicycle,
    Foot,
}

impl OsrmProfile {
    /// Profile name used in request URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsrmProfile::Car => "car",
            OsrmProfile::Bicycle => "bicycle",
            OsrmProfile::Foot => "foot",
        }
    }

    fn lua_path(&self) -> String {
        format!("/opt/{}.lua", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
    pub profile: OsrmProfile,
}

impl OsrmDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            profile: OsrmProfile::default(),
        }
    }

    pub fn profile(mut self, profile: OsrmProfile) -> Self {
        self.profile = profile;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum OsrmDataError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("OSRM preprocessing failed: {0}")]
    ProcessFailure(String),
}

impl OsrmDataset {
    /// Downloads and preprocesses the region unless the outputs already exist.
    pub fn ensure(config: &OsrmDatasetConfig) -> Result<Self, OsrmDataError> {
        let region_name = config.region.name();
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(format!("{}-{}", region_name, config.profile.as_str()));
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{}-latest.osm.pbf", region_name));
        if !pbf_path.exists() {
            info!(url = %config.region.url(), "downloading OSM extract");
            download_pbf(&config.region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", region_name));
        if !osrm_base.exists() {
            info!(region = %region_name, profile = config.profile.as_str(), "extracting OSRM graph");
            run_docker(
                &[
                    "osrm-extract",
                    "-p",
                    &config.profile.lua_path(),
                    &format!("/data/{}", file_name(&pbf_path)),
                ],
                &data_dir,
            )?;
        }

        if !mld_ready(&osrm_base) {
            info!(region = %region_name, "partitioning and customizing OSRM graph");
            let target = format!("/data/{}", file_name(&osrm_base));
            run_docker(&["osrm-partition", &target], &data_dir)?;
            run_docker(&["osrm-customize", &target], &data_dir)?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
            pbf_path,
        })
    }

    /// Arguments for `osrm-routed` inside the container.
    pub fn routed_args(&self) -> Vec<String> {
        vec![
            "osrm-routed".to_string(),
            "--algorithm".to_string(),
            "mld".to_string(),
            format!("/data/{}", file_name(&self.osrm_base)),
        ]
    }
}

fn download_pbf(url: &str, dest: &Path) -> Result<(), OsrmDataError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    let bytes = response.bytes()?;
    writer.write_all(&bytes)?;
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

fn run_docker(args: &[&str], data_dir: &Path) -> Result<(), OsrmDataError> {
    let status = Command::new("docker")
        .arg("run")
        .arg("--rm")
        .arg("-t")
        .arg("-v")
        .arg(format!("{}:/data", data_dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(OsrmDataError::ProcessFailure(format!(
            "docker {} exited with status {}",
            args.first().copied().unwrap_or_default(),
            status
        )))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
