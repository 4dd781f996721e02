//! Container configuration bodies sent to `containers/create` and
//! `containers/{id}/start`.
//!
//! The engine distinguishes an absent field from a `null` one, so every
//! optional field is skipped entirely when unset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Serialises as `{}`; the engine uses empty objects as set members in
/// `ExposedPorts` and `Volumes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

/// One host-side binding for a container port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    /// Host interface to bind; empty means all interfaces.
    pub host_ip: String,
    /// Host port.
    pub host_port: String,
}

/// `ExposedPorts` map keyed by `"<port>/<protocol>"`.
pub type ExposedPorts = BTreeMap<String, EmptyObject>;

/// `PortBindings` map keyed by `"<port>/<protocol>"`.
pub type PortBindings = BTreeMap<String, Vec<PortBinding>>;

/// Parses `"hostPort:containerPort[/protocol]"` pairs.
///
/// The protocol defaults to `tcp`. Several host ports may bind the same
/// container port.
pub fn parse_ports<I, S>(pairs: I) -> Result<(ExposedPorts, PortBindings), EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut exposed = ExposedPorts::new();
    let mut bindings = PortBindings::new();

    for pair in pairs {
        let pair = pair.as_ref();
        let unsupported = || EngineError::InvalidRequest {
            message: format!("unsupported port mapping '{pair}', expected hostPort:containerPort"),
        };

        let (host_port, container_port) = pair.split_once(':').ok_or_else(unsupported)?;
        if container_port.contains(':') {
            return Err(unsupported());
        }
        let (container_port, protocol) = match container_port.split_once('/') {
            Some((_, protocol)) if protocol.contains('/') => return Err(unsupported()),
            Some((port, protocol)) => (port, protocol),
            None => (container_port, "tcp"),
        };

        let key = format!("{container_port}/{protocol}");
        exposed.insert(key.clone(), EmptyObject {});
        bindings.entry(key).or_default().push(PortBinding {
            host_ip: String::new(),
            host_port: host_port.to_string(),
        });
    }

    Ok((exposed, bindings))
}

/// Body of a `containers/create` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub exposed_ports: ExposedPorts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub tty: bool,
    pub open_stdin: bool,
    /// Memory limit in bytes; `0` means unlimited.
    pub memory: u64,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    pub cmd: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<String>>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<BTreeMap<String, EmptyObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes_from: Option<String>,
    pub stdin_once: bool,
}

impl ContainerConfig {
    /// Creates a configuration running `cmd` in `image` with every optional
    /// field unset.
    pub fn new<I, S>(image: impl Into<String>, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            cmd: cmd.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Exposes the container side of each `"hostPort:containerPort"` pair.
    ///
    /// The host side is applied at start time through
    /// [`StartOptions::port_bindings`](crate::StartOptions).
    pub fn with_ports<I, S>(mut self, pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (exposed, _) = parse_ports(pairs)?;
        self.exposed_ports = exposed;
        Ok(self)
    }
}
