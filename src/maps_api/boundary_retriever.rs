use futures::future::{BoxFuture, FutureExt};
use geojson::{FeatureCollection, GeoJson};

use crate::error::MapError;

use super::loader::BoundarySource;

/// Accepts a body only when it parses to a GeoJSON feature collection.
pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection, MapError> {
    match body.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
        Ok(_) => Err(MapError::InvalidGeometryPayload(
            "payload is not a feature collection".to_string(),
        )),
        Err(e) => Err(MapError::InvalidGeometryPayload(e.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryRetriever {
    client: reqwest::Client,
}

impl BoundaryRetriever {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<FeatureCollection, MapError> {
        log::info!("Fetching country boundaries from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MapError::GeometryFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MapError::GeometryFetchFailed(format!(
                "GeoJSON error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MapError::GeometryFetchFailed(e.to_string()))?;

        parse_feature_collection(&body)
    }
}

impl BoundarySource for BoundaryRetriever {
    fn fetch_boundaries<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FeatureCollection, MapError>> {
        self.fetch(url).boxed()
    }
}
