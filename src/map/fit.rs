use super::country::CountryFeature;
use super::geo::GeoBounds;

/// Contiguous United States, leaving out Alaska, Hawaii and the territories.
pub const CONTIGUOUS_US: GeoBounds = GeoBounds::new(24.396308, -125.0, 49.384358, -66.934570);
pub const US_MAX_ZOOM: f64 = 4.0;

const US_NAMES: [&str; 2] = ["United States of America", "United States"];

/// Where the view should move to after a country is selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTarget {
    /// Box to fit, with `west <= east` (east may exceed 180).
    pub bounds: GeoBounds,
    pub max_zoom: f64,
    pub crosses_date_line: bool,
}

/// `10 - log2(area)` kept within [2, 6].
pub fn zoom_for_area(area: f64) -> f64 {
    (10.0 - area.log2()).clamp(2.0, 6.0)
}

pub fn fit_target(feature: &CountryFeature) -> Option<FitTarget> {
    if feature.name.as_deref().is_some_and(|name| US_NAMES.contains(&name)) {
        return Some(FitTarget {
            bounds: CONTIGUOUS_US,
            max_zoom: US_MAX_ZOOM,
            crosses_date_line: false,
        });
    }

    let bounds = feature.bounds?;
    Some(FitTarget {
        bounds: bounds.unwrapped(),
        max_zoom: zoom_for_area(bounds.area()),
        crosses_date_line: bounds.crosses_date_line(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::country::{Polygon, RiskTier};
    use approx::assert_abs_diff_eq;

    fn feature(name: &str, bounds: Option<GeoBounds>) -> CountryFeature {
        CountryFeature {
            name: Some(name.to_string()),
            iso3: None,
            cases: 0,
            deaths: 0,
            recovered: 0,
            risk: RiskTier::Low,
            polygons: vec![Polygon::default()],
            bounds,
        }
    }

    #[test]
    fn united_states_uses_the_contiguous_box() {
        let alaska_included = GeoBounds::new(18.0, 172.0, 72.0, -66.0);
        for name in US_NAMES {
            let target = fit_target(&feature(name, Some(alaska_included))).unwrap();
            assert_eq!(target.bounds, CONTIGUOUS_US);
            assert_eq!(target.max_zoom, 4.0);
            assert!(!target.crosses_date_line);
        }
    }

    #[test]
    fn date_line_crossing_moves_east_by_a_full_turn() {
        let target = fit_target(&feature("Fiji", Some(GeoBounds::new(-20.0, 170.0, -10.0, -170.0)))).unwrap();
        assert!(target.crosses_date_line);
        assert_eq!(target.bounds.west(), 170.0);
        assert_eq!(target.bounds.east(), 190.0);
    }

    #[test]
    fn regular_country_keeps_its_box() {
        let bounds = GeoBounds::new(40.0, 0.0, 50.0, 10.0);
        let target = fit_target(&feature("France", Some(bounds))).unwrap();
        assert!(!target.crosses_date_line);
        assert_eq!(target.bounds, bounds);
        // area 100 -> 10 - 6.64 = 3.36
        assert_abs_diff_eq!(target.max_zoom, 10.0 - 100f64.log2(), epsilon = 1e-12);
    }

    #[test]
    fn zoom_formula_is_clamped() {
        assert_eq!(zoom_for_area(0.01), 6.0);
        assert_eq!(zoom_for_area(1.0), 6.0);
        assert_eq!(zoom_for_area(16.0), 6.0);
        assert_abs_diff_eq!(zoom_for_area(32.0), 5.0);
        assert_eq!(zoom_for_area(1_000_000.0), 2.0);
        // a zero-area box would give +inf before clamping
        assert_eq!(zoom_for_area(0.0), 6.0);
    }

    #[test]
    fn feature_without_bounds_has_no_target() {
        assert!(fit_target(&feature("Nowhere", None)).is_none());
    }
}
