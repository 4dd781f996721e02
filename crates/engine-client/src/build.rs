//! Scanning a build log for the image it produced.
//!
//! The engine streams build progress as lines (JSON-wrapped on newer API
//! versions) and announces success with `Successfully built <hex id>`. A log
//! that ends without that line is a failed build, whatever else it says.

use std::sync::Arc;

use engine::{EngineError, ImageId, MarkerPolicy};
use futures_util::StreamExt;
use tracing::debug;

use crate::lines::LineBuffer;
use crate::observer::StreamObserver;
use crate::transport::HttpResponse;

const SUCCESS_MARKER: &str = "Successfully built ";

/// Extracts the image id from a success line.
///
/// The id is the run of lowercase hex digits right after the marker; the line
/// may carry other text around it.
pub fn success_marker(line: &str) -> Option<ImageId> {
    line.match_indices(SUCCESS_MARKER).find_map(|(at, _)| {
        let rest = &line[at + SUCCESS_MARKER.len()..];
        let end = rest
            .find(|c: char| !matches!(c, '0'..='9' | 'a'..='f'))
            .unwrap_or(rest.len());
        ImageId::new(&rest[..end])
    })
}

/// Line scanner for one build log.
pub struct BuildScan {
    lines: LineBuffer,
    policy: MarkerPolicy,
    image: Option<ImageId>,
    origin: String,
    observer: Arc<dyn StreamObserver>,
}

impl BuildScan {
    pub fn new(
        origin: impl Into<String>,
        policy: MarkerPolicy,
        observer: Arc<dyn StreamObserver>,
    ) -> Self {
        Self {
            lines: LineBuffer::new(),
            policy,
            image: None,
            origin: origin.into(),
            observer,
        }
    }

    pub fn on_data(&mut self, chunk: &[u8]) {
        self.lines.push(chunk);
        while let Some(line) = self.lines.next_line() {
            self.on_line(&line);
        }
    }

    /// Image captured so far.
    pub fn image(&self) -> Option<&ImageId> {
        self.image.as_ref()
    }

    /// Ends the scan: the captured image, or a build failure.
    pub fn finish(mut self) -> Result<ImageId, EngineError> {
        if let Some(rest) = self.lines.finish() {
            self.on_line(&rest);
        }
        match self.image {
            Some(image) => {
                debug!(origin = %self.origin, %image, "build succeeded");
                Ok(image)
            }
            None => Err(EngineError::BuildFailed {
                reason: format!("{} ended without a success marker", self.origin),
            }),
        }
    }

    fn on_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.observer.on_line(&self.origin, line.trim());

        if self.image.is_some() && self.policy == MarkerPolicy::First {
            return;
        }
        if let Some(image) = success_marker(line) {
            self.image = Some(image);
        }
    }
}

/// Consumes a build response body with a [`BuildScan`].
pub struct BuildLogScanner {
    origin: String,
    policy: MarkerPolicy,
    observer: Arc<dyn StreamObserver>,
}

impl BuildLogScanner {
    pub fn new(
        origin: impl Into<String>,
        policy: MarkerPolicy,
        observer: Arc<dyn StreamObserver>,
    ) -> Self {
        Self {
            origin: origin.into(),
            policy,
            observer,
        }
    }

    /// Reads the whole log and resolves to the built image.
    pub async fn scan(self, response: HttpResponse) -> Result<ImageId, EngineError> {
        let mut scan = BuildScan::new(self.origin, self.policy, self.observer);
        if response.content_length != Some(0) {
            let mut body = response.body;
            while let Some(chunk) = body.next().await {
                scan.on_data(&chunk?);
            }
        }
        scan.finish()
    }
}
