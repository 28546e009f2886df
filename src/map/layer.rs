use rstar::{RTree, RTreeObject, AABB};

use super::country::{CountryFeature, RiskFilter};
use super::geo::{project, Coordinate};
use super::style::{filter_style, style_for, FeatureStyle, StyleOverride};

#[derive(Debug)]
struct FeatureEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Triangulated fill of one polygon, holes cut out.
#[derive(Debug, Clone, Default)]
pub struct FillMesh {
    pub vertices: Vec<[f64; 2]>,
    /// Three per triangle, into `vertices`.
    pub indices: Vec<u32>,
}

/// Triangulates a polygon given as its outer ring followed by its holes.
/// Rings may repeat their first point at the end.
pub fn triangulate(rings: &[Vec<[f64; 2]>]) -> FillMesh {
    let open = |ring: &Vec<[f64; 2]>| -> usize {
        match (ring.first(), ring.last()) {
            (Some(first), Some(last)) if ring.len() > 1 && first == last => ring.len() - 1,
            _ => ring.len(),
        }
    };

    let Some(outer) = rings.first() else {
        return FillMesh::default();
    };
    if open(outer) < 3 {
        return FillMesh::default();
    }

    let mut vertices = Vec::new();
    let mut holes = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        let len = open(ring);
        if i > 0 {
            if len < 3 {
                continue;
            }
            holes.push(vertices.len());
        }
        vertices.extend_from_slice(&ring[..len]);
    }

    let coords: Vec<f64> = vertices.iter().flat_map(|p| [p[0], p[1]]).collect();
    match earcutr::earcut(&coords, &holes, 2) {
        Ok(indices) => FillMesh {
            vertices,
            indices: indices.into_iter().map(|i| i as u32).collect(),
        },
        Err(e) => {
            log::warn!("Could not triangulate polygon: {:?}", e);
            FillMesh::default()
        }
    }
}

/// A feature's rings in Web-Mercator world pixels at zoom 0.
#[derive(Debug, Clone, Default)]
pub struct ProjectedShape {
    /// Polygons, each outer ring first.
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
    /// One per polygon.
    pub fills: Vec<FillMesh>,
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl ProjectedShape {
    fn of(feature: &CountryFeature) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        let polygons: Vec<Vec<Vec<[f64; 2]>>> = feature
            .polygons
            .iter()
            .map(|polygon| {
                polygon
                    .rings
                    .iter()
                    .map(|ring| {
                        ring.iter()
                            .map(|&(lon, lat)| {
                                let (x, y) = project(&Coordinate::new(lat, lon), 0.0);
                                min = [min[0].min(x), min[1].min(y)];
                                max = [max[0].max(x), max[1].max(y)];
                                [x, y]
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();
        let fills = polygons.iter().map(|polygon| triangulate(polygon)).collect();
        Self {
            polygons,
            fills,
            min,
            max,
        }
    }
}

/// The country shapes currently on the map, with their live styles.
///
/// Built once per successful load and replaced wholesale by the next one.
pub struct CountryLayer {
    features: Vec<CountryFeature>,
    styles: Vec<FeatureStyle>,
    shapes: Vec<ProjectedShape>,
    index: RTree<FeatureEnvelope>,
    generation: u64,
}

impl CountryLayer {
    pub fn new(features: Vec<CountryFeature>, generation: u64) -> Self {
        let styles = features.iter().map(|f| style_for(f.cases)).collect();
        let shapes = features.iter().map(ProjectedShape::of).collect();
        let envelopes = features
            .iter()
            .enumerate()
            .filter_map(|(index, f)| {
                f.envelope().map(|(min, max)| FeatureEnvelope {
                    index,
                    envelope: AABB::from_corners(min, max),
                })
            })
            .collect();

        Self {
            features,
            styles,
            shapes,
            index: RTree::bulk_load(envelopes),
            generation,
        }
    }

    /// Load generation this layer was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[cfg(test)]
    pub fn features(&self) -> &[CountryFeature] {
        &self.features
    }

    pub fn feature(&self, index: usize) -> Option<&CountryFeature> {
        self.features.get(index)
    }

    #[cfg(test)]
    pub fn style(&self, index: usize) -> Option<&FeatureStyle> {
        self.styles.get(index)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&CountryFeature, &FeatureStyle)> {
        self.features.iter().zip(self.styles.iter())
    }

    /// Styles and projected rings, in feature order.
    pub fn shapes(&self) -> impl Iterator<Item = (&FeatureStyle, &ProjectedShape)> {
        self.styles.iter().zip(self.shapes.iter())
    }

    pub fn reset_style(&mut self, index: usize) {
        if let (Some(style), Some(feature)) = (self.styles.get_mut(index), self.features.get(index)) {
            *style = style_for(feature.cases);
        }
    }

    pub fn reset_all_styles(&mut self) {
        for index in 0..self.features.len() {
            self.reset_style(index);
        }
    }

    pub fn set_style(&mut self, index: usize, style: &StyleOverride) {
        if let Some(current) = self.styles.get_mut(index) {
            current.apply(style);
        }
    }

    /// Restyles every feature for the given filter. Nothing is refetched.
    pub fn apply_risk_filter(&mut self, filter: RiskFilter, dark_mode: bool) {
        for (feature, style) in self.features.iter().zip(self.styles.iter_mut()) {
            style.apply(&filter_style(filter, feature.risk, dark_mode));
        }
    }

    /// Index of the feature whose shape contains `point`, lowest index first.
    pub fn hit_test(&self, point: &Coordinate) -> Option<usize> {
        let probe = AABB::from_point([point.longitude(), point.latitude()]);
        self.index
            .locate_in_envelope_intersecting(&probe)
            .map(|candidate| candidate.index)
            .filter(|&index| self.features[index].contains(point))
            .min()
    }
}
