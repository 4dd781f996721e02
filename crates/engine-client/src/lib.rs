//! Non-blocking client for a container engine's HTTP control API.
//!
//! Talks HTTP/1.1 to the engine over a Unix domain socket (default) or TCP.
//! Every operation is an `async fn` returning `Result<_, engine::EngineError>`;
//! nothing is retried.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request formatting, transport selection, status
//! classification, and stream handling all live here. Domain values and the
//! error taxonomy come from the [`engine`] crate.
//!
//! ## Request Flow
//!
//! ```text
//! Client ──▶ RequestSpec ──▶ Dispatcher ──▶ Transport
//!                                              │
//!            single-shot ◀── decode ◀──────────┤
//!            attach      ◀── AttachStreamReader┤
//!            build       ◀── BuildLogScanner ◀─┘
//! ```
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`transport`] | `Transport` trait, Unix-socket and TCP transports |
//! | [`request`] | `RequestSpec` and the `Dispatcher` |
//! | [`response`] | Status classification and body decoding |
//! | [`lines`] | Line reassembly for streamed bodies |
//! | [`attach`] | Attach stream state machine |
//! | [`build`] | Build log scanning |
//! | [`observer`] | Output-line side channel |
//! | [`config`] | `ClientConfig` |
//! | [`client`] | The `Client` facade |

pub mod attach;
pub mod build;
pub mod client;
pub mod config;
pub mod lines;
pub mod observer;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
mod testing;

pub use attach::{AttachOutcome, AttachSession, AttachState, AttachStreamReader, StopPattern};
pub use build::{success_marker, BuildLogScanner, BuildScan};
pub use client::Client;
pub use config::ClientConfig;
pub use lines::LineBuffer;
pub use observer::{StreamObserver, TracingObserver};
pub use request::{Dispatcher, Flag, QueryValue, RequestBody, RequestSpec};
pub use response::{decode, Decoded};
pub use transport::{
    BodyStream, ConnectionControl, HttpResponse, HttpTransport, PreparedRequest, Transport,
    TransportError, UnixSocketTransport,
};
