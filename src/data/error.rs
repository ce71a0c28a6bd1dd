use thiserror::Error;

/// Failures surfaced by the data pipeline.
///
/// The pipeline never retries; every variant is handed back to the caller,
/// which decides whether to show it, reload, or give up.
#[derive(Debug, Error)]
pub enum DataError {
    /// The source could not be fetched, or its content is not a usable table.
    #[error("data unavailable from {origin}: {reason}")]
    DataUnavailable { origin: String, reason: String },

    /// The raw bytes are not valid text in the configured encoding.
    #[error("cannot decode {origin} as {encoding}")]
    DecodeError {
        origin: String,
        encoding: &'static str,
    },

    /// An average was requested for a city with no payments.
    #[error("no payments recorded for city '{0}'")]
    EmptyGroup(String),
}

impl DataError {
    pub(crate) fn unavailable(origin: impl Into<String>, reason: impl ToString) -> Self {
        DataError::DataUnavailable {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}
