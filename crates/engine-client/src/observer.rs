//! Side channel for lines read from attach and build streams.
//!
//! Observation never influences an operation's result. The default observer
//! forwards lines to `tracing`; tests and embedding applications can inject
//! their own to capture output.

use tracing::debug;

/// Receives each complete, non-empty line of a streamed response.
pub trait StreamObserver: Send + Sync {
    /// `origin` names the stream, e.g. `containers/4fa6e0f0c678/attach`.
    fn on_line(&self, origin: &str, line: &str);
}

/// Emits every line as a `debug` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StreamObserver for TracingObserver {
    fn on_line(&self, origin: &str, line: &str) {
        debug!(origin, line, "stream output");
    }
}
