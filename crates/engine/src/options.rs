//! Per-operation arguments.
//!
//! These carry caller intent only; turning them into query strings and bodies
//! is the client's job.

use serde::{Deserialize, Serialize};

use crate::{ImageTag, PortBindings};

/// Filters for `containers/json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainersQuery {
    /// Include stopped containers.
    pub all: bool,
    /// Maximum number of containers; `-1` means no limit.
    pub limit: i64,
    /// Only containers created after this container id.
    pub since: Option<String>,
    /// Only containers created before this container id.
    pub before: Option<String>,
    /// Report container sizes.
    pub size: Option<bool>,
}

impl ContainersQuery {
    /// Only the most recently created container, running or not.
    pub fn latest() -> Self {
        Self {
            all: true,
            limit: 1,
            ..Self::default()
        }
    }
}

impl Default for ContainersQuery {
    fn default() -> Self {
        Self {
            all: false,
            limit: -1,
            since: None,
            before: None,
            size: None,
        }
    }
}

/// Filters for `images/json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagesQuery {
    /// Include intermediate layers.
    pub all: bool,
    /// Only images whose repository name matches.
    pub filter: Option<String>,
}

/// Host configuration applied by `containers/{id}/start`.
///
/// Empty collections are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartOptions {
    /// Volume binds, `"host:container[:ro]"`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub binds: Vec<String>,
    #[serde(skip_serializing_if = "PortBindings::is_empty", default)]
    pub port_bindings: PortBindings,
    /// Links, `"name:alias"`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub links: Vec<String>,
}

/// Seconds the engine waits for a graceful stop before killing.
pub const DEFAULT_STOP_WAIT_SECONDS: u32 = 5;

/// Which streams `containers/{id}/attach` delivers, and when to hang up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Replay output produced before the attach.
    pub logs: bool,
    /// Keep streaming new output.
    pub stream: bool,
    pub stdout: bool,
    pub stderr: bool,
    /// Close the connection as soon as this text appears in the output
    /// (ASCII case-insensitive).
    pub stop_pattern: Option<String>,
}

impl AttachOptions {
    /// Streams stdout and stderr, including earlier output.
    pub fn follow() -> Self {
        Self {
            logs: true,
            stream: true,
            stdout: true,
            stderr: true,
            stop_pattern: None,
        }
    }

    /// Hangs up once `pattern` shows up in the output.
    pub fn until(mut self, pattern: impl Into<String>) -> Self {
        self.stop_pattern = Some(pattern.into());
        self
    }
}

/// Flags for `build`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Tag applied to the resulting image.
    pub tag: Option<ImageTag>,
    /// Suppress verbose build output.
    pub quiet: bool,
    /// Do not use the layer cache.
    pub nocache: bool,
    /// Remove intermediate containers after a successful build.
    pub rm: bool,
}

/// Where the engine finds the build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildContext {
    /// A tar archive containing a `Dockerfile`, uploaded as the request body.
    Archive(Vec<u8>),
    /// A URL the engine fetches itself; no body is sent.
    Remote(String),
}

/// Flags for removing a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Also remove the container's anonymous volumes.
    pub volumes: bool,
    /// Kill a running container first.
    pub force: bool,
}
