//! Client configuration.
//!
//! Deserialisable so that host applications can embed it in their own config
//! files, e.g.
//!
//! ```toml
//! endpoint = "unix:///var/run/docker.sock"
//! api_version = "1.8"
//! timeout_seconds = 30
//! marker_policy = "first"
//! ```
//!
//! Every key is optional.

use std::time::Duration;

use engine::{ApiVersion, Endpoint, MarkerPolicy};
use serde::{Deserialize, Serialize};

/// Settings fixed for the lifetime of a [`Client`](crate::Client).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the engine listens. Defaults to the local socket.
    pub endpoint: Endpoint,

    /// API version prefixed into request paths. Defaults to `1.8`.
    pub api_version: ApiVersion,

    /// Bound on connection setup plus the response head, handed to the
    /// transport. `None` waits indefinitely.
    #[serde(rename = "timeout_seconds", with = "optional_seconds")]
    pub timeout: Option<Duration>,

    /// Which success marker names a build's image.
    pub marker_policy: MarkerPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_marker_policy(mut self, marker_policy: MarkerPolicy) -> Self {
        self.marker_policy = marker_policy;
        self
    }
}

mod optional_seconds {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
