//! Shared value types: where the engine lives and which API dialect it speaks.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Engine API version tag, prefixed into every request path (`/v1.8/info`).
///
/// Parsed from `"1.8"` or `"v1.8"`; serialised as `"1.8"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl ApiVersion {
    /// Creates a new [`ApiVersion`].
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns the path segment for this version, e.g. `"v1.8"`.
    pub fn path_segment(self) -> String {
        format!("v{self}")
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::new(1, 8)
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidApiVersion {
            value: s.to_string(),
        };
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let (major, minor) = trimmed.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.to_string()
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Address of the engine daemon.
///
/// Immutable once a client is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    /// A Unix domain socket on the local file system.
    Unix(PathBuf),
    /// A TCP host and port, spoken to in plain HTTP/1.1.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl Endpoint {
    /// Default socket path of a locally installed engine.
    pub const DEFAULT_SOCKET: &'static str = "/var/run/docker.sock";
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Unix(PathBuf::from(Self::DEFAULT_SOCKET))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp { host, port } => write!(f, "http://{host}:{port}"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidEndpoint {
            value: s.to_string(),
        };

        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let authority = s
            .strip_prefix("http://")
            .or_else(|| s.strip_prefix("tcp://"))
            .ok_or_else(invalid)?
            .trim_end_matches('/');
        let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self::Tcp {
            host: host.to_string(),
            port: port.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for Endpoint {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

// ---------------------------------------------------------------------------
// Build result policy
// ---------------------------------------------------------------------------

/// Which `Successfully built <id>` line names the build result when a log
/// contains several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Keep the first marker; later ones are ignored.
    #[default]
    First,
    /// Keep the last marker, i.e. the image produced by the final stage.
    Last,
}
