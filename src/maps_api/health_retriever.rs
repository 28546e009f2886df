use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use crate::error::MapError;
use crate::map::country::{HealthMap, HealthRecord};

use super::loader::HealthSource;

/// One row of the statistics API response.
#[derive(Debug, Deserialize)]
pub struct CountryStats {
    #[serde(rename = "countryInfo")]
    pub country_info: CountryInfo,
    #[serde(default)]
    pub cases: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub recovered: u64,
}

#[derive(Debug, Deserialize)]
pub struct CountryInfo {
    pub iso3: Option<String>,
}

/// Keys the statistics rows by ISO3 code. Rows without a code are dropped.
pub fn health_map(rows: Vec<CountryStats>) -> HealthMap {
    rows.into_iter()
        .filter_map(|row| match row.country_info.iso3 {
            Some(code) if !code.is_empty() => Some((
                code,
                HealthRecord {
                    cases: row.cases,
                    deaths: row.deaths,
                    recovered: row.recovered,
                },
            )),
            _ => {
                log::debug!("Skipping statistics row without ISO3 code");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct HealthRetriever {
    client: reqwest::Client,
    url: String,
}

impl HealthRetriever {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub async fn fetch(&self) -> Result<HealthMap, MapError> {
        log::info!("Fetching statistics from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MapError::StatsFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MapError::StatsFetchFailed(format!(
                "statistics API error: {}",
                response.status()
            )));
        }

        let rows: Vec<CountryStats> = response
            .json()
            .await
            .map_err(|e| MapError::StatsFetchFailed(e.to_string()))?;

        let health = health_map(rows);
        log::debug!("Statistics mapped for {} countries", health.len());
        Ok(health)
    }
}

impl HealthSource for HealthRetriever {
    fn fetch_health(&self) -> BoxFuture<'_, Result<HealthMap, MapError>> {
        self.fetch().boxed()
    }
}
