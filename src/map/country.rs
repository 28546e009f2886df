use std::collections::HashMap;
use std::fmt;

use geojson::{FeatureCollection, Value};

use super::geo::{Coordinate, GeoBounds};

/// Property carrying the join key in the boundary dataset.
pub const ISO3_PROPERTY: &str = "ISO3166-1-Alpha-3";
/// Display-name properties, in order of preference.
pub const NAME_PROPERTIES: [&str; 2] = ["ADMIN", "name"];

pub const HIGH_RISK_CASES: u64 = 1_000_000;
pub const MEDIUM_RISK_CASES: u64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_cases(cases: u64) -> Self {
        if cases > HIGH_RISK_CASES {
            RiskTier::High
        } else if cases > MEDIUM_RISK_CASES {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The risk-level filter offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl RiskFilter {
    pub const ALL: [RiskFilter; 4] = [RiskFilter::All, RiskFilter::Low, RiskFilter::Medium, RiskFilter::High];

    pub fn tier(&self) -> Option<RiskTier> {
        match self {
            RiskFilter::All => None,
            RiskFilter::Low => Some(RiskTier::Low),
            RiskFilter::Medium => Some(RiskTier::Medium),
            RiskFilter::High => Some(RiskTier::High),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self.tier() {
            Some(tier) => tier.as_str(),
            None => "all",
        }
    }
}

impl fmt::Display for RiskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case counts for one country, as reported by the statistics API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthRecord {
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
}

/// Statistics keyed by ISO3 code.
pub type HealthMap = HashMap<String, HealthRecord>;

/// One ring of `(longitude, latitude)` pairs.
pub type Ring = Vec<(f64, f64)>;

/// Outer ring first, holes after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    /// Even-odd test over all rings, so holes are excluded.
    pub fn contains(&self, point: &Coordinate) -> bool {
        let (px, py) = (point.longitude(), point.latitude());
        let mut inside = false;
        for ring in &self.rings {
            if ring.len() < 3 {
                continue;
            }
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

#[derive(Debug, Clone)]
pub struct CountryFeature {
    pub name: Option<String>,
    pub iso3: Option<String>,
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub risk: RiskTier,
    pub polygons: Vec<Polygon>,
    /// `None` for features without polygon geometry.
    pub bounds: Option<GeoBounds>,
}

impl CountryFeature {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        self.polygons.iter().any(|p| p.contains(point))
    }

    /// Plain min/max envelope in `[lon, lat]`, ignoring antimeridian wrapping.
    pub fn envelope(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for (lon, lat) in self.points() {
            min = [min[0].min(lon), min[1].min(lat)];
            max = [max[0].max(lon), max[1].max(lat)];
        }
        min[0].is_finite().then_some((min, max))
    }

    fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.polygons
            .iter()
            .flat_map(|p| p.rings.iter())
            .flat_map(|r| r.iter().copied())
    }
}

/// Joins boundary features with statistics by ISO3 code.
///
/// Features without a statistics row get zero counts and the low tier.
pub fn merge_health(collection: FeatureCollection, health: &HealthMap) -> Vec<CountryFeature> {
    collection
        .features
        .into_iter()
        .map(|feature| {
            let iso3 = feature
                .property(ISO3_PROPERTY)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let name = NAME_PROPERTIES
                .iter()
                .find_map(|key| feature.property(*key).and_then(|v| v.as_str()))
                .map(str::to_string);

            let record = iso3
                .as_ref()
                .and_then(|code| health.get(code))
                .copied()
                .unwrap_or_default();

            let polygons = match feature.geometry.map(|g| g.value) {
                Some(Value::Polygon(rings)) => vec![to_polygon(rings)],
                Some(Value::MultiPolygon(polygons)) => polygons.into_iter().map(to_polygon).collect(),
                Some(_) | None => {
                    log::warn!("Feature {:?} has no polygon geometry", name);
                    Vec::new()
                }
            };

            let bounds = GeoBounds::from_points(
                polygons
                    .iter()
                    .flat_map(|p| p.rings.first())
                    .flat_map(|r| r.iter().copied()),
            );

            CountryFeature {
                name,
                iso3,
                cases: record.cases,
                deaths: record.deaths,
                recovered: record.recovered,
                risk: RiskTier::from_cases(record.cases),
                polygons,
                bounds,
            }
        })
        .collect()
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Polygon {
    Polygon {
        rings: rings
            .into_iter()
            .map(|ring| {
                ring.into_iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| (position[0], position[1]))
                    .collect()
            })
            .collect(),
    }
}
