use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} request failed with status {status}")]
    Status { resource: &'static str, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A post whose `date` cannot be read as a timestamp.
#[derive(Debug, Error)]
#[error("post {slug:?} has an unreadable date {date:?}")]
pub struct InvalidPostDate {
    pub slug: String,
    pub date: String,
}

/// Failure while building an endpoint body from CMS data.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    InvalidDate(#[from] InvalidPostDate),
    #[error("failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),
}
