use crate::utils::config_loader::LoadConfigError;
use thiserror::Error;

/// Failures that reject a scan. Read-level failures never surface here; they degrade to
/// absent pools and zero quotes inside discovery and quoting.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unknown base token: {0}")]
    UnknownBaseToken(String),
    #[error("Invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },
    #[error("Input ceiling must be greater than zero")]
    ZeroCeiling,
    #[error("Hop limit {0} is outside 2..=4")]
    InvalidHopLimit(usize),
    #[error("{name} = {value} bps is out of range")]
    BpsOutOfRange { name: &'static str, value: i64 },
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),
    #[error("Venue selection is empty")]
    EmptyVenueSelection,
    #[error("Token universe unavailable")]
    UniverseUnavailable,
    #[error("Config error: {0}")]
    Config(#[from] LoadConfigError),
}

impl ScanError {
    pub(crate) fn invalid_amount(value: &str, reason: impl ToString) -> Self {
        ScanError::InvalidAmount { value: value.to_string(), reason: reason.to_string() }
    }
}
