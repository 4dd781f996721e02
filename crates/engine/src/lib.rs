//! Domain types for talking to a container engine's HTTP control API.
//!
//! This crate names things (containers, images, endpoints, API versions),
//! describes what a caller wants from each operation, and defines the error
//! taxonomy every operation reports through. It performs no I/O; the
//! `engine-client` crate turns these values into HTTP exchanges.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ContainerId`, `ImageId`, `ImageTag`) |
//! | [`types`] | `ApiVersion`, `Endpoint`, `MarkerPolicy` |
//! | [`container`] | `ContainerConfig` body and port-mapping parsing |
//! | [`options`] | Per-operation query and body options |
//! | [`errors`] | `EngineError`, `ErrorKind`, `StatusClass` |

pub mod container;
pub mod errors;
pub mod identifiers;
pub mod options;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use container::{
    parse_ports, ContainerConfig, EmptyObject, ExposedPorts, PortBinding, PortBindings,
};
pub use errors::{EngineError, ErrorKind, StatusClass};
pub use identifiers::{ContainerId, ImageId, ImageTag};
pub use options::{
    AttachOptions, BuildContext, BuildOptions, ContainersQuery, ImagesQuery, RemoveOptions,
    StartOptions, DEFAULT_STOP_WAIT_SECONDS,
};
pub use types::{ApiVersion, Endpoint, MarkerPolicy};
