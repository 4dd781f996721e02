//! Both transports against canned HTTP servers on real sockets.

mod common;

use std::future::Future;
use std::time::Duration;

use common::{init_tracing, serve_tcp, serve_unix, socket_path, Canned};
use engine::{
    ApiVersion, AttachOptions, BuildContext, BuildOptions, ContainerId, Endpoint, ErrorKind,
};
use engine_client::{AttachOutcome, Client, ClientConfig};

async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("test exceeded its time limit")
}

fn unix_client(path: &std::path::Path) -> Client {
    init_tracing();
    Client::new(ClientConfig::new(Endpoint::Unix(path.to_path_buf()))).unwrap()
}

fn tcp_config(port: u16) -> ClientConfig {
    init_tracing();
    ClientConfig::new(Endpoint::Tcp {
        host: "127.0.0.1".into(),
        port,
    })
}

fn container() -> ContainerId {
    ContainerId::new("abc").unwrap()
}

// ---------------------------------------------------------------------------
// Unix socket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn info_over_unix_socket() {
    let path = socket_path();
    let server = serve_unix(path.clone(), Canned::json("200 OK", r#"{"Containers":2}"#));

    let info = within(unix_client(&path).info()).await.unwrap();
    assert_eq!(info["Containers"], 2);

    let request = within(server).await.unwrap().to_ascii_lowercase();
    assert!(request.starts_with("get /v1.8/info http/1.1\r\n"), "{request}");
    assert!(request.contains("host: localhost\r\n"), "{request}");
}

#[tokio::test]
async fn no_content_reply_resolves_without_waiting_for_close() {
    let path = socket_path();
    let _server = serve_unix(path.clone(), Canned::no_content());

    let body = within(unix_client(&path).stop(&container(), 5))
        .await
        .unwrap();

    assert_eq!(body, "");
}

#[tokio::test]
async fn attach_stops_an_endless_stream_on_pattern() {
    let path = socket_path();
    let _server = serve_unix(
        path.clone(),
        Canned::chunked(&["booting\n", "Listening on :80\n", "request 1\n"], true),
    );

    let outcome = within(
        unix_client(&path).attach(&container(), &AttachOptions::follow().until("listening on")),
    )
    .await
    .unwrap();

    assert_eq!(outcome, AttachOutcome::Matched);
}

#[tokio::test]
async fn attach_ends_when_the_engine_finishes_the_stream() {
    let path = socket_path();
    let _server = serve_unix(path.clone(), Canned::chunked(&["done\n"], false));

    let outcome = within(unix_client(&path).attach(&container(), &AttachOptions::follow()))
        .await
        .unwrap();

    assert_eq!(outcome, AttachOutcome::Closed);
}

#[tokio::test]
async fn missing_socket_is_a_transport_error() {
    let path = socket_path();

    let error = within(unix_client(&path).info()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.to_string().contains(&path.display().to_string()), "{error}");
}

#[tokio::test]
async fn silent_unix_engine_times_out() {
    init_tracing();
    let path = socket_path();
    let _server = serve_unix(path.clone(), Canned::silent());
    let client = Client::new(
        ClientConfig::new(Endpoint::Unix(path.clone())).with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let error = within(client.info()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wait_over_tcp_uses_the_configured_version() {
    let (port, server) = serve_tcp(Canned::json("200 OK", r#"{"StatusCode":137}"#)).await;
    let client = Client::new(tcp_config(port).with_api_version(ApiVersion::new(1, 41))).unwrap();

    let result = within(client.wait(&container())).await.unwrap();
    assert_eq!(result["StatusCode"], 137);

    let request = within(server).await.unwrap().to_ascii_lowercase();
    assert!(
        request.starts_with("post /v1.41/containers/abc/wait http/1.1\r\n"),
        "{request}"
    );
}

#[tokio::test]
async fn build_over_tcp_streams_the_log() {
    let (port, server) = serve_tcp(Canned::chunked(
        &[
            "Step 1 : FROM base\n",
            " ---> b750fe79269d\n",
            "Successfully built 0123abcd\n",
        ],
        false,
    ))
    .await;
    let client = Client::new(tcp_config(port)).unwrap();

    let image = within(client.build(
        BuildContext::Archive(b"archive".to_vec()),
        &BuildOptions::default(),
    ))
    .await
    .unwrap();
    assert_eq!(image.as_str(), "0123abcd");

    let request = within(server).await.unwrap();
    let lowered = request.to_ascii_lowercase();
    assert!(lowered.starts_with("post /v1.8/build?"), "{request}");
    assert!(lowered.contains("content-type: application/tar"), "{request}");
    assert!(request.ends_with("archive"), "{request}");
}

#[tokio::test]
async fn server_failure_over_tcp_is_classified() {
    let (port, _server) = serve_tcp(Canned::json("500 Internal Server Error", "\"boom\"")).await;
    let client = Client::new(tcp_config(port)).unwrap();

    let error = within(client.version()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::ServerError);
    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn silent_tcp_engine_times_out() {
    let (port, _server) = serve_tcp(Canned::silent()).await;
    let client =
        Client::new(tcp_config(port).with_timeout(Duration::from_millis(200))).unwrap();

    let error = within(client.info()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
}
