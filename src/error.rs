// Crate error type
// Every failure of a remote task-service call ends up here

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid task service url: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("task service unreachable: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("task service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("tasks payload is not a collection (got {0})")]
    NotACollection(&'static str),

    #[error("task service did not answer within {0} seconds")]
    Timeout(u64),

    #[error("task {0} not found")]
    NotFound(String),

    #[error("template error: {0}")]
    Template(#[from] upon::Error),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),
}

impl Error {
    /// Whether the remote service reported the resource as missing
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
