//! The [`Client`] facade: one async method per engine operation.

use std::sync::Arc;

use engine::{
    ApiVersion, AttachOptions, BuildContext, BuildOptions, ContainerConfig, ContainerId,
    ContainersQuery, EngineError, Endpoint, ImageId, ImagesQuery, MarkerPolicy, RemoveOptions,
    StartOptions,
};
use http::HeaderValue;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::attach::{AttachOutcome, AttachStreamReader};
use crate::build::BuildLogScanner;
use crate::config::ClientConfig;
use crate::observer::{StreamObserver, TracingObserver};
use crate::request::{Dispatcher, Flag, RequestSpec};
use crate::response::{self, Decoded};
use crate::transport::{self, Transport};

/// Non-blocking client for one engine endpoint.
///
/// Cheap to clone; clones share the transport. Requests issued concurrently
/// complete in no particular order.
#[derive(Clone)]
pub struct Client {
    dispatcher: Dispatcher,
    observer: Arc<dyn StreamObserver>,
    marker_policy: MarkerPolicy,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", self.dispatcher.endpoint())
            .field("api_version", &self.dispatcher.version())
            .field("marker_policy", &self.marker_policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the transport matching the configured endpoint.
    pub fn new(config: ClientConfig) -> Result<Self, EngineError> {
        let transport = transport::connect(&config.endpoint, config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.endpoint, config.api_version, transport),
            observer: Arc::new(TracingObserver),
            marker_policy: config.marker_policy,
        }
    }

    /// Replaces the observer receiving attach and build output lines.
    pub fn with_observer(mut self, observer: Arc<dyn StreamObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.dispatcher.endpoint()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.dispatcher.version()
    }

    // -----------------------------------------------------------------------
    // Single-shot plumbing
    // -----------------------------------------------------------------------

    async fn request(&self, spec: RequestSpec) -> Result<Decoded, EngineError> {
        let expect_json = spec.expects_json();
        let response = self.dispatcher.dispatch(spec).await?;
        response::decode(response, expect_json).await
    }

    async fn request_json(&self, spec: RequestSpec) -> Result<Value, EngineError> {
        Ok(self.request(spec.expect_json(true)).await?.into_json())
    }

    async fn request_raw(&self, spec: RequestSpec) -> Result<String, EngineError> {
        Ok(self.request(spec.expect_json(false)).await?.into_text())
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    /// `GET /info`: daemon-wide information.
    pub async fn info(&self) -> Result<Value, EngineError> {
        self.request_json(RequestSpec::get("info")).await
    }

    /// `GET /version`: engine version details.
    pub async fn version(&self) -> Result<Value, EngineError> {
        self.request_json(RequestSpec::get("version")).await
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    /// `GET /images/json`.
    pub async fn images(&self, query: &ImagesQuery) -> Result<Value, EngineError> {
        let spec = RequestSpec::get("images/json")
            .query("all", query.all)
            .query("filter", query.filter.clone());
        self.request_json(spec).await
    }

    /// `POST /build`: builds an image and resolves to its id.
    ///
    /// Fails with [`EngineError::BuildFailed`] if the log never announces a
    /// built image.
    #[instrument(skip_all, fields(endpoint = %self.endpoint(), tag = ?options.tag))]
    pub async fn build(
        &self,
        context: BuildContext,
        options: &BuildOptions,
    ) -> Result<ImageId, EngineError> {
        let mut spec = RequestSpec::post("build")
            .query("q", options.quiet)
            .query("nocache", options.nocache)
            .query("rm", options.rm)
            .query("t", options.tag.as_ref().map(|t| t.to_string()));
        spec = match context {
            BuildContext::Remote(url) => spec.query("remote", url),
            BuildContext::Archive(archive) => {
                spec.raw(archive, HeaderValue::from_static("application/tar"))
            }
        };

        let response = self.dispatcher.dispatch(spec).await?;
        let response = response::ensure_success(response).await?;
        BuildLogScanner::new("build", self.marker_policy, self.observer.clone())
            .scan(response)
            .await
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// `GET /containers/json`.
    pub async fn containers(&self, query: &ContainersQuery) -> Result<Value, EngineError> {
        let spec = RequestSpec::get("containers/json")
            .query("all", query.all)
            .query("limit", query.limit)
            .query("since", query.since.clone())
            .query("before", query.before.clone())
            .query("size", query.size);
        self.request_json(spec).await
    }

    /// `POST /containers/create`. The response carries the new container's id.
    pub async fn create_container(
        &self,
        config: &ContainerConfig,
        name: Option<&str>,
    ) -> Result<Value, EngineError> {
        let spec = RequestSpec::post("containers/create")
            .query("name", name)
            .json(config)?;
        self.request_json(spec).await
    }

    /// `GET /containers/{id}/json`.
    pub async fn inspect(&self, container: &ContainerId) -> Result<Value, EngineError> {
        self.request_json(RequestSpec::get(format!("containers/{container}/json")))
            .await
    }

    /// `POST /containers/{id}/start`. Returns the raw response body.
    pub async fn start(
        &self,
        container: &ContainerId,
        options: &StartOptions,
    ) -> Result<String, EngineError> {
        debug!(%container, ?options, "starting container");
        let spec = RequestSpec::post(format!("containers/{container}/start")).json(options)?;
        self.request_raw(spec).await
    }

    /// `POST /containers/{id}/stop`, giving the container `wait_seconds` to
    /// exit before it is killed.
    pub async fn stop(
        &self,
        container: &ContainerId,
        wait_seconds: u32,
    ) -> Result<String, EngineError> {
        debug!(%container, wait_seconds, "stopping container");
        let spec =
            RequestSpec::post(format!("containers/{container}/stop")).query("t", wait_seconds);
        self.request_raw(spec).await
    }

    /// `POST /containers/{id}/wait`: blocks (asynchronously) until the
    /// container exits and returns `{"StatusCode": <exit code>}`.
    pub async fn wait(&self, container: &ContainerId) -> Result<Value, EngineError> {
        let result = self
            .request_json(RequestSpec::post(format!("containers/{container}/wait")))
            .await?;
        debug!(%container, exit_code = %result["StatusCode"], "container stopped");
        Ok(result)
    }

    /// `POST /containers/{id}/attach`: follows the container's output until
    /// the engine closes the stream or the stop pattern shows up.
    #[instrument(skip_all, fields(container = %container))]
    pub async fn attach(
        &self,
        container: &ContainerId,
        options: &AttachOptions,
    ) -> Result<AttachOutcome, EngineError> {
        let path = format!("containers/{container}/attach");
        let spec = RequestSpec::post(path.clone())
            .query("logs", Flag(options.logs))
            .query("stream", Flag(options.stream))
            .query("stdin", Flag(false))
            .query("stdout", Flag(options.stdout))
            .query("stderr", Flag(options.stderr));

        let response = self.dispatcher.dispatch(spec).await?;
        let response = response::ensure_success(response).await?;
        AttachStreamReader::new(path, options.stop_pattern.as_deref(), self.observer.clone())
            .read(response)
            .await
    }

    /// `DELETE /containers/{id}`. Returns the raw response body.
    pub async fn remove_container(
        &self,
        container: &ContainerId,
        options: RemoveOptions,
    ) -> Result<String, EngineError> {
        let spec = RequestSpec::delete(format!("containers/{container}"))
            .query("v", Flag(options.volumes))
            .query("force", Flag(options.force));
        self.request_raw(spec).await
    }
}
