//! Error taxonomy for every engine operation.
//!
//! Each operation either resolves with its documented value or fails with
//! exactly one [`EngineError`]. [`ErrorKind`] collapses the variants into the
//! five categories callers branch on. Nothing in this workspace retries; retry
//! policy, if wanted, belongs to the caller.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Coarse category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The engine rejected the request (status 400–499).
    ClientError,
    /// The engine failed while handling the request (status 500–599).
    ServerError,
    /// The connection could not be established, was lost, or produced an
    /// unusable response.
    Transport,
    /// A build stream finished without announcing a built image.
    BuildFailure,
    /// The request could not be constructed; no I/O was attempted.
    Programmer,
}

/// Range of HTTP status codes a response falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 400–499.
    ClientError,
    /// 500–599.
    ServerError,
    /// Anything else. The engine answers `304 Not Modified` to redundant
    /// start/stop requests, which callers treat as success.
    Success,
}

impl StatusClass {
    /// Classifies a raw HTTP status code.
    pub fn of(status: u16) -> Self {
        match status {
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Success,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine answered with a 4xx status.
    ///
    /// The body is kept verbatim: the engine puts its human-readable reason
    /// there (e.g. `"No such container: abc"`).
    #[error("{status} Client Error: {body}")]
    ClientError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The engine answered with a 5xx status.
    #[error("{status} Server Error: {body}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The exchange failed below HTTP semantics: connect failure, socket
    /// permissions, reset, timeout.
    #[error("Transport error: {source}")]
    Transport {
        /// Underlying transport failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A successful response carried a body that could not be decoded.
    #[error("Invalid response body: {message}")]
    InvalidResponse {
        /// Description of the decoding failure.
        message: String,
    },

    /// The build stream ended without a `Successfully built <id>` line.
    ///
    /// The HTTP exchange itself succeeded; the build did not.
    #[error("Build failed: {reason}")]
    BuildFailed {
        /// Why no image was produced.
        reason: String,
    },

    /// The request could not be constructed (e.g. a body that does not
    /// serialise). Raised before any network I/O.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the construction problem.
        message: String,
    },

    /// An endpoint string could not be parsed.
    #[error("Invalid endpoint '{value}': expected unix://<path>, http://<host>:<port> or tcp://<host>:<port>")]
    InvalidEndpoint {
        /// The rejected input.
        value: String,
    },

    /// An API version string could not be parsed.
    #[error("Invalid API version '{value}': expected <major>.<minor>")]
    InvalidApiVersion {
        /// The rejected input.
        value: String,
    },
}

impl EngineError {
    /// Builds the error for a non-success status, or `None` when `status` is
    /// not an error code.
    pub fn from_status(status: u16, body: impl Into<String>) -> Option<Self> {
        match StatusClass::of(status) {
            StatusClass::ClientError => Some(Self::ClientError {
                status,
                body: body.into(),
            }),
            StatusClass::ServerError => Some(Self::ServerError {
                status,
                body: body.into(),
            }),
            StatusClass::Success => None,
        }
    }

    /// Wraps any transport-level failure.
    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientError { .. } => ErrorKind::ClientError,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::Transport { .. } | Self::InvalidResponse { .. } => ErrorKind::Transport,
            Self::BuildFailed { .. } => ErrorKind::BuildFailure,
            Self::InvalidRequest { .. }
            | Self::InvalidEndpoint { .. }
            | Self::InvalidApiVersion { .. } => ErrorKind::Programmer,
        }
    }

    /// HTTP status attached to the error, if the engine produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ClientError { status, .. } | Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
