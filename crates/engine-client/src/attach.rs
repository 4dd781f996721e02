//! Reading a container's attached output until it ends or says a magic word.
//!
//! [`AttachSession`] is the per-request state machine:
//!
//! ```text
//!              chunk contains stop pattern
//!  Listening ───────────────────────────────▶ Matched   (connection aborted)
//!      │ \──── body ends ───────────────────▶ Closed
//!       \───── transport error ─────────────▶ Errored
//! ```
//!
//! Only the first terminal transition resolves. Aborting from inside chunk
//! handling can race with the transport finishing the body on its own, so
//! every event that arrives after a terminal state is ignored.
//!
//! [`AttachStreamReader`] drives a session from an [`HttpResponse`] body.

use std::sync::Arc;

use engine::EngineError;
use futures_util::StreamExt;
use tracing::debug;

use crate::lines::LineBuffer;
use crate::observer::StreamObserver;
use crate::transport::{ConnectionControl, HttpResponse, TransportError};

/// State of one attach stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Listening,
    /// The stop pattern appeared and the connection was closed by us.
    Matched,
    /// The engine ended the stream.
    Closed,
    Errored,
}

/// How a successful attach ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Matched,
    Closed,
}

/// Case-insensitive (ASCII) substring matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPattern(Vec<u8>);

impl StopPattern {
    /// Returns `None` for an empty pattern, which would match everything.
    pub fn new(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            None
        } else {
            Some(Self(pattern.as_bytes().to_vec()))
        }
    }

    pub fn is_found_in(&self, haystack: &[u8]) -> bool {
        haystack
            .windows(self.0.len())
            .any(|window| window.eq_ignore_ascii_case(&self.0))
    }

    /// Like [`is_found_in`](Self::is_found_in), but skips the first
    /// `scanned` bytes, which an earlier call already searched. The last
    /// `len - 1` of those are searched again so a match straddling the
    /// boundary is still found.
    pub fn is_found_after(&self, haystack: &[u8], scanned: usize) -> bool {
        let from = scanned.saturating_sub(self.0.len() - 1).min(haystack.len());
        self.is_found_in(&haystack[from..])
    }
}

pub type Resolution = Option<Result<AttachOutcome, EngineError>>;

/// State machine for one attach response body.
pub struct AttachSession {
    state: AttachState,
    lines: LineBuffer,
    /// Bytes of the line buffer's pending fragment already searched for the
    /// stop pattern.
    scanned: usize,
    stop_pattern: Option<StopPattern>,
    origin: String,
    observer: Arc<dyn StreamObserver>,
    connection: Arc<dyn ConnectionControl>,
}

impl AttachSession {
    pub fn new(
        origin: impl Into<String>,
        stop_pattern: Option<StopPattern>,
        observer: Arc<dyn StreamObserver>,
        connection: Arc<dyn ConnectionControl>,
    ) -> Self {
        Self {
            state: AttachState::Listening,
            lines: LineBuffer::new(),
            scanned: 0,
            stop_pattern,
            origin: origin.into(),
            observer,
            connection,
        }
    }

    pub fn state(&self) -> AttachState {
        self.state
    }

    /// Handles one body chunk. Returns the resolution if this chunk ended the
    /// session.
    pub fn on_data(&mut self, chunk: &[u8]) -> Resolution {
        if self.state != AttachState::Listening {
            return None;
        }

        self.lines.push(chunk);
        let matched = self
            .stop_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_found_after(self.lines.pending(), self.scanned));
        self.forward_lines();
        self.scanned = self.lines.pending().len();
        if !matched {
            return None;
        }

        self.flush();
        self.state = AttachState::Matched;
        debug!(origin = %self.origin, "stop pattern seen, closing attach connection");
        self.connection.abort();
        Some(Ok(AttachOutcome::Matched))
    }

    /// Handles the natural end of the body.
    pub fn on_end(&mut self) -> Resolution {
        if self.state != AttachState::Listening {
            return None;
        }
        self.flush();
        self.state = AttachState::Closed;
        debug!(origin = %self.origin, "attach stream closed by engine");
        Some(Ok(AttachOutcome::Closed))
    }

    /// Handles a transport failure while reading the body.
    pub fn on_error(&mut self, error: TransportError) -> Resolution {
        if self.state != AttachState::Listening {
            return None;
        }
        self.state = AttachState::Errored;
        debug!(origin = %self.origin, %error, "attach stream failed");
        Some(Err(error.into()))
    }

    fn forward_lines(&mut self) {
        while let Some(line) = self.lines.next_line() {
            self.emit(&line);
        }
    }

    fn flush(&mut self) {
        self.forward_lines();
        if let Some(rest) = self.lines.finish() {
            self.emit(&rest);
        }
    }

    fn emit(&self, line: &str) {
        if !line.is_empty() {
            self.observer.on_line(&self.origin, line);
        }
    }
}

/// Consumes an attach response body with an [`AttachSession`].
pub struct AttachStreamReader {
    origin: String,
    stop_pattern: Option<StopPattern>,
    observer: Arc<dyn StreamObserver>,
}

impl AttachStreamReader {
    pub fn new(
        origin: impl Into<String>,
        stop_pattern: Option<&str>,
        observer: Arc<dyn StreamObserver>,
    ) -> Self {
        Self {
            origin: origin.into(),
            stop_pattern: stop_pattern.and_then(StopPattern::new),
            observer,
        }
    }

    /// Reads until the stop pattern, the end of the body, or a transport
    /// error. An announced zero-length body resolves at once.
    pub async fn read(self, response: HttpResponse) -> Result<AttachOutcome, EngineError> {
        let mut session = AttachSession::new(
            self.origin,
            self.stop_pattern,
            self.observer,
            response.connection,
        );

        if response.content_length != Some(0) {
            let mut body = response.body;
            while let Some(chunk) = body.next().await {
                let resolution = match chunk {
                    Ok(bytes) => session.on_data(&bytes),
                    Err(error) => session.on_error(error),
                };
                if let Some(result) = resolution {
                    return result;
                }
            }
        }

        // Still listening here, so `on_end` always resolves.
        session.on_end().unwrap_or(Ok(AttachOutcome::Closed))
    }
}
