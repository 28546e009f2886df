use std::str::FromStr;
use std::time::Duration;

use crate::error::MapError;
use crate::map::geo::{Coordinate, GeoBounds};

pub const DEFAULT_HEALTH_URL: &str = "https://disease.sh/v3/covid-19/countries";
pub const DEFAULT_GEO_PRIMARY_URL: &str =
    "https://raw.githubusercontent.com/datasets/geo-countries/master/data/countries.geojson";
pub const DEFAULT_GEO_BACKUP_URL: &str = "https://datahub.io/core/geo-countries/r/countries.geojson";
pub const DEFAULT_TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_nolabels/{z}/{x}/{y}{r}.png";
pub const DEFAULT_ATTRIBUTION: &str = "©OpenStreetMap, ©CartoDB";
pub const DEFAULT_DISEASE: &str = "COVID-19";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub health_url: String,
    pub geo_primary_url: String,
    pub geo_backup_url: String,
    pub retry_count: usize,
    pub backoff: Duration,
    pub disease: String,
    pub map: MapOptions,
    pub tiles: TileLayerOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            health_url: DEFAULT_HEALTH_URL.to_string(),
            geo_primary_url: DEFAULT_GEO_PRIMARY_URL.to_string(),
            geo_backup_url: DEFAULT_GEO_BACKUP_URL.to_string(),
            retry_count: 3,
            backoff: Duration::from_millis(1000),
            disease: DEFAULT_DISEASE.to_string(),
            map: MapOptions::default(),
            tiles: TileLayerOptions::default(),
        }
    }
}

impl AppConfig {
    /// Reads overrides from the process environment. `main` loads `.env`
    /// into it before this runs.
    pub fn from_env() -> Result<Self, MapError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to the
    /// defaults for every key the lookup does not know.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MapError> {
        let mut config = Self::default();

        if let Some(url) = lookup("EPIMAP_HEALTH_URL") {
            config.health_url = url;
        }
        if let Some(url) = lookup("EPIMAP_GEO_PRIMARY_URL") {
            config.geo_primary_url = url;
        }
        if let Some(url) = lookup("EPIMAP_GEO_BACKUP_URL") {
            config.geo_backup_url = url;
        }
        if let Some(url) = lookup("EPIMAP_TILE_URL") {
            config.tiles.url_template = url;
        }
        if let Some(disease) = lookup("EPIMAP_DISEASE") {
            config.disease = disease;
        }
        if let Some(count) = lookup("EPIMAP_RETRY_COUNT") {
            config.retry_count = parse_key("EPIMAP_RETRY_COUNT", &count)?;
        }
        if let Some(ms) = lookup("EPIMAP_BACKOFF_MS") {
            config.backoff = Duration::from_millis(parse_key("EPIMAP_BACKOFF_MS", &ms)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        let urls = [
            ("EPIMAP_HEALTH_URL", &self.health_url),
            ("EPIMAP_GEO_PRIMARY_URL", &self.geo_primary_url),
            ("EPIMAP_GEO_BACKUP_URL", &self.geo_backup_url),
            ("EPIMAP_TILE_URL", &self.tiles.url_template),
        ];
        for (key, url) in urls {
            if url.trim().is_empty() {
                return Err(MapError::ConfigMissing(key.to_string()));
            }
        }
        if self.retry_count == 0 {
            return Err(MapError::ConfigMissing("EPIMAP_RETRY_COUNT must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_key<T: FromStr>(key: &str, value: &str) -> Result<T, MapError> {
    value
        .trim()
        .parse()
        .map_err(|_| MapError::ConfigMissing(format!("{} is not a number: {:?}", key, value)))
}

/// Constraints handed to every new map view.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub max_bounds: GeoBounds,
    /// 1.0 means the viewport can never be dragged outside `max_bounds`.
    pub max_bounds_viscosity: f64,
    pub initial_center: Coordinate,
    pub initial_zoom: f64,
    pub zoom_snap: f64,
    pub fit_padding: f32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 2.0,
            max_zoom: 8.0,
            max_bounds: GeoBounds::new(-85.0, -180.0, 85.0, 180.0),
            max_bounds_viscosity: 1.0,
            initial_center: Coordinate::new(20.0, 0.0),
            initial_zoom: 3.0,
            zoom_snap: 0.5,
            fit_padding: 50.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileLayerOptions {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub max_zoom: u32,
    /// Substituted for `{r}`; empty for standard resolution tiles.
    pub retina_suffix: String,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            max_zoom: 19,
            retina_suffix: String::new(),
        }
    }
}
