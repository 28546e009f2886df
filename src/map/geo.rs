/// Side of a square Web-Mercator tile, in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Web-Mercator square ends.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Default for Coordinate {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Same point with the longitude folded back into [-180, 180].
    pub fn wrapped(&self) -> Self {
        let mut longitude = (self.longitude + 180.0).rem_euclid(360.0) - 180.0;
        if longitude == -180.0 && self.longitude > 0.0 {
            longitude = 180.0;
        }
        Self::new(self.latitude, longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    south: f64, // minimum latitude
    west: f64,  // minimum longitude, may exceed `east` across the antimeridian
    north: f64, // maximum latitude
    east: f64,  // maximum longitude
}

impl GeoBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Smallest box around a set of `(longitude, latitude)` points.
    ///
    /// When wrapping across the antimeridian gives a narrower longitude span
    /// than the direct one, the wrapped box is returned and `west > east`.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut south = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut west = f64::INFINITY;
        let mut east = f64::NEG_INFINITY;
        // Same extremes with negative longitudes shifted by a full turn.
        let mut shifted_west = f64::INFINITY;
        let mut shifted_east = f64::NEG_INFINITY;

        for (lon, lat) in points {
            south = south.min(lat);
            north = north.max(lat);
            west = west.min(lon);
            east = east.max(lon);
            let shifted = if lon < 0.0 { lon + 360.0 } else { lon };
            shifted_west = shifted_west.min(shifted);
            shifted_east = shifted_east.max(shifted);
        }

        if !south.is_finite() {
            return None;
        }

        if shifted_east - shifted_west < east - west {
            let fold = |lon: f64| if lon > 180.0 { lon - 360.0 } else { lon };
            return Some(Self::new(south, fold(shifted_west), north, fold(shifted_east)));
        }

        Some(Self::new(south, west, north, east))
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    /// Raw `|north - south| * |east - west|` in square degrees.
    pub fn area(&self) -> f64 {
        (self.north - self.south).abs() * (self.east - self.west).abs()
    }

    pub fn crosses_date_line(&self) -> bool {
        self.west > self.east
    }

    /// Copy whose east edge is moved a full turn when the box crosses the
    /// antimeridian, so that `west <= east` holds.
    pub fn unwrapped(&self) -> Self {
        if self.crosses_date_line() {
            Self::new(self.south, self.west, self.north, self.east + 360.0)
        } else {
            *self
        }
    }

    pub fn center(&self) -> Coordinate {
        let b = self.unwrapped();
        Coordinate {
            latitude: (b.south + b.north) / 2.0,
            longitude: (b.west + b.east) / 2.0,
        }
    }
}

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2.0_f64.powf(zoom)
}

/// Projects a coordinate to Web-Mercator world pixels at the given zoom.
/// Longitudes outside [-180, 180] keep going past the world edge.
pub fn project(coordinate: &Coordinate, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coordinate
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (coordinate.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> Coordinate {
    let size = world_size(zoom);
    let longitude = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
    let latitude = n.sinh().atan().to_degrees();
    Coordinate::new(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn project_round_trips_through_unproject() {
        let paris = Coordinate::new(48.8566, 2.3522);
        let (x, y) = project(&paris, 5.5);
        let back = unproject(x, y, 5.5);
        assert_abs_diff_eq!(back.latitude(), paris.latitude(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.longitude(), paris.longitude(), epsilon = 1e-9);
    }

    #[test]
    fn origin_projects_to_world_center() {
        let (x, y) = project(&Coordinate::default(), 2.0);
        assert_abs_diff_eq!(x, 512.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 512.0, epsilon = 1e-9);
    }

    #[test]
    fn bounds_of_plain_points() {
        let b = GeoBounds::from_points(vec![(10.0, 40.0), (20.0, 50.0), (15.0, 45.0)]).unwrap();
        assert_eq!(b, GeoBounds::new(40.0, 10.0, 50.0, 20.0));
        assert!(!b.crosses_date_line());
        assert_abs_diff_eq!(b.area(), 100.0);
    }

    #[test]
    fn bounds_straddling_the_antimeridian_wrap() {
        let b = GeoBounds::from_points(vec![(170.0, -20.0), (179.5, -15.0), (-170.0, -10.0)]).unwrap();
        assert!(b.crosses_date_line());
        assert_eq!(b.west(), 170.0);
        assert_eq!(b.east(), -170.0);
        assert_eq!(b.unwrapped().east(), 190.0);
        assert_abs_diff_eq!(b.center().longitude(), 180.0);
    }

    #[test]
    fn wide_but_continuous_bounds_do_not_wrap() {
        let b = GeoBounds::from_points(vec![(-60.0, 0.0), (100.0, 10.0)]).unwrap();
        assert!(!b.crosses_date_line());
    }

    #[test]
    fn empty_point_set_has_no_bounds() {
        assert!(GeoBounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn wrapped_folds_longitude() {
        assert_abs_diff_eq!(Coordinate::new(0.0, 190.0).wrapped().longitude(), -170.0);
        assert_abs_diff_eq!(Coordinate::new(0.0, -190.0).wrapped().longitude(), 170.0);
        assert_abs_diff_eq!(Coordinate::new(0.0, 180.0).wrapped().longitude(), 180.0);
    }

    #[test]
    fn center_of_wrapped_box_sits_on_the_antimeridian() {
        let b = GeoBounds::new(-20.0, 170.0, -10.0, -170.0);
        assert_abs_diff_eq!(b.center().latitude(), -15.0);
        assert_abs_diff_eq!(b.center().longitude(), 180.0);
    }
}
