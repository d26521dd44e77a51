use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::normalize::NormalizeRules;

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "BEAR_DASHBOARD_CONFIG";
/// Env var overriding the observation source path.
pub const SOURCE_ENV: &str = "BEAR_DASHBOARD_SOURCE";
/// Env var overriding the map strategy (`points` | `cluster`).
pub const MAP_ENV: &str = "BEAR_DASHBOARD_MAP";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "bear_dashboard.json";

// ---------------------------------------------------------------------------
// Map strategy
// ---------------------------------------------------------------------------

/// How observations are drawn on the map. Both draw the heatmap layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStrategy {
    /// One marker per observation, coloured by subspecies.
    #[default]
    Points,
    /// Grid-clustered markers labelled with their size.
    Cluster,
}

impl FromStr for MapStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "points" | "point" => Ok(MapStrategy::Points),
            "cluster" | "clusters" => Ok(MapStrategy::Cluster),
            other => bail!("unknown map strategy '{other}' (expected 'points' or 'cluster')"),
        }
    }
}

// ---------------------------------------------------------------------------
// Map settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Heat grid cells across the longer side of the data.
    pub heat_resolution: usize,
    /// Blur radius in heat cells.
    pub heat_radius: f64,
    /// Alpha floor for drawn heat cells.
    pub min_opacity: f32,
    /// Visible plot width divided by this gives the cluster cell size.
    pub cluster_divisions: f64,
    pub marker_radius: f32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            heat_resolution: 64,
            heat_radius: 2.5,
            min_opacity: 0.4,
            cluster_divisions: 12.0,
            marker_radius: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Observation file opened at startup.
    pub source: PathBuf,
    pub map_strategy: MapStrategy,
    pub rules: NormalizeRules,
    pub map: MapSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("bear_observations_bc.csv"),
            map_strategy: MapStrategy::default(),
            rules: NormalizeRules::default(),
            map: MapSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Resolve the config from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve the config using `env` for variable lookups.
    ///
    /// File: `$BEAR_DASHBOARD_CONFIG`, else `./bear_dashboard.json` if it
    /// exists, else defaults. Env overrides are applied on top.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match env(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(source) = env(SOURCE_ENV) {
            config.source = PathBuf::from(source);
        }
        if let Some(strategy) = env(MAP_ENV) {
            config.map_strategy = strategy
                .parse()
                .with_context(|| format!("invalid {MAP_ENV}"))?;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
