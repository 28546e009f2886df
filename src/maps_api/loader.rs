use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use geojson::FeatureCollection;

use crate::error::MapError;
use crate::map::country::{merge_health, CountryFeature, HealthMap};

use super::retry::RetryPolicy;

pub trait HealthSource: Send + Sync {
    fn fetch_health(&self) -> BoxFuture<'_, Result<HealthMap, MapError>>;
}

pub trait BoundarySource: Send + Sync {
    fn fetch_boundaries<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FeatureCollection, MapError>>;
}

/// What the loading indicator should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    Loading,
    /// `attempt` failed attempts out of `of` so far (one based).
    Retrying { attempt: usize, of: usize },
}

impl LoadProgress {
    pub fn message(&self) -> String {
        match self {
            LoadProgress::Loading => "Loading map data...".to_string(),
            LoadProgress::Retrying { attempt, of } => format!("Retrying... ({}/{})", attempt, of),
        }
    }
}

/// Fetches statistics, then boundaries (with retries), and joins them.
#[derive(Clone)]
pub struct DataLoader {
    health: Arc<dyn HealthSource>,
    boundaries: Arc<dyn BoundarySource>,
    primary_url: String,
    backup_url: String,
    policy: RetryPolicy,
}

impl DataLoader {
    pub fn new(
        health: Arc<dyn HealthSource>,
        boundaries: Arc<dyn BoundarySource>,
        primary_url: String,
        backup_url: String,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            health,
            boundaries,
            primary_url,
            backup_url,
            policy,
        }
    }

    /// Runs one full load. A statistics failure aborts at once; boundary
    /// failures are retried according to the policy.
    pub async fn load<S, F, P>(&self, sleep: S, mut progress: P) -> Result<Vec<CountryFeature>, MapError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
        P: FnMut(LoadProgress),
    {
        progress(LoadProgress::Loading);

        let health = self.health.fetch_health().await.map_err(|e| {
            log::error!("Failed to load health data: {}", e);
            e
        })?;
        log::debug!("Health data mapping holds {} countries", health.len());

        let of = self.policy.max_attempts;
        let collection = self
            .policy
            .run(
                |attempt| {
                    let url = self
                        .policy
                        .url_for_attempt(attempt, &self.primary_url, &self.backup_url);
                    self.boundaries.fetch_boundaries(url)
                },
                sleep,
                |attempt, err| {
                    log::error!("Attempt {} failed: {}", attempt + 1, err);
                    progress(LoadProgress::Retrying { attempt: attempt + 1, of });
                },
            )
            .await
            .map_err(|exhausted| MapError::GeometryExhausted {
                attempts: exhausted.attempts,
                last: Box::new(exhausted.last.unwrap_or_else(|| {
                    MapError::GeometryFetchFailed("no attempts were allowed".to_string())
                })),
            })?;

        let features = merge_health(collection, &health);
        log::info!(
            "Merged {} boundary features with {} statistics rows",
            features.len(),
            health.len()
        );
        Ok(features)
    }
}
