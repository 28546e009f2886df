use thiserror::Error;

/// Everything that can go wrong between start-up and a rendered map.
///
/// A country without a statistics row is not an error: it is merged with zero
/// counts instead.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("configuration missing or invalid: {0}")]
    ConfigMissing(String),

    #[error("statistics fetch failed: {0}")]
    StatsFetchFailed(String),

    #[error("geometry fetch failed: {0}")]
    GeometryFetchFailed(String),

    #[error("invalid geometry payload: {0}")]
    InvalidGeometryPayload(String),

    #[error("geometry unavailable after {attempts} attempts: {last}")]
    GeometryExhausted { attempts: usize, last: Box<MapError> },

    #[error("tile {z}/{x}/{y} failed: {reason}")]
    TileFetchFailed { z: u32, x: u32, y: u32, reason: String },
}

impl MapError {
    /// Failures that abort a data load leave the user a manual retry. Tile
    /// and configuration errors only reach the log.
    pub fn offers_manual_retry(&self) -> bool {
        matches!(self, MapError::GeometryExhausted { .. } | MapError::StatsFetchFailed(_))
    }
}
