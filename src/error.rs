//! Error taxonomy
//!
//! Only configuration problems are errors. Content gaps at tick time are
//! handled locally and reported through logs and tick reports.

/// Errors surfaced by configuration loading and streamer initialization.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("No track template configured; streamer disabled")]
    MissingTemplate,

    #[error("Invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TrackError::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}
