//! `HttpTransport` against a local mock server.

#![cfg(feature = "http-client")]

use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;

use feedkit::operation::Pipeline;
use feedkit::request::ApiRequest;
use feedkit::store::{MemoryStore, RecordStore};
use feedkit::transport::{HttpTransport, Transport};
use feedkit::{ClientConfig, Dispatcher, Error, ErrorKind, RecordKind};

fn transport() -> HttpTransport {
    HttpTransport::from_config(&ClientConfig::default().with_timeout(2_000)).unwrap()
}

#[tokio::test]
async fn sends_auth_and_json_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/me")
        .match_header("authorization", "Bearer tok")
        .match_header("accept", "application/json")
        .match_header("content-type", "application/json")
        .match_header("user-agent", Matcher::Regex("^feedkit/".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": null}"#)
        .create_async()
        .await;

    let request = ApiRequest::profile("tok")
        .with_base_url(server.url())
        .build()
        .unwrap();
    let tree = transport().send(request).await.unwrap();

    assert_eq!(tree, json!({"data": null}));
    mock.assert_async().await;
}

#[tokio::test]
async fn forwards_query_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/users/u1/publications")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("tag".into(), "rust lang".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .create_async()
        .await;

    let request = ApiRequest::publications("u1", "tok")
        .with_base_url(server.url())
        .with_parameter("limit", "10")
        .with_parameter("tag", "rust lang")
        .build()
        .unwrap();
    assert_eq!(transport().send(request).await.unwrap(), json!({"data": []}));
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/me")
        .with_status(401)
        .with_body(r#"{"errors": [{"message": "Token was invalid."}]}"#)
        .create_async()
        .await;

    let request = ApiRequest::profile("bad")
        .with_base_url(server.url())
        .build()
        .unwrap();
    let err = transport().send(request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    match err {
        Error::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Token was invalid"));
        },
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn html_body_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/me")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let request = ApiRequest::profile("tok")
        .with_base_url(server.url())
        .build()
        .unwrap();
    let err = transport().send(request).await.unwrap_err();
    assert!(matches!(err, Error::MalformedBody(_)));
}

#[tokio::test]
async fn empty_body_is_null() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/me")
        .with_status(204)
        .create_async()
        .await;

    let request = ApiRequest::profile("tok")
        .with_base_url(server.url())
        .build()
        .unwrap();
    assert_eq!(transport().send(request).await.unwrap(), serde_json::Value::Null);
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let request = ApiRequest::profile("tok")
        .with_base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = transport().send(request).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn dispatcher_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/users/u1/publications")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(
            json!({"data": [
                {"id": "p1", "name": "T1", "description": "S1", "url": "http://x/p1", "imageUrl": "http://x/p1.png"},
                {"id": "p2", "name": "T2", "description": "S2", "url": "http://x/p2", "imageUrl": "http://x/p2.png"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::default().with_api_server(server.url());
    let dispatcher = Dispatcher::from_config(config, store.clone()).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = dispatcher.fetch_publications("u1", "tok", move |result| {
        let _ = tx.send(result);
    });
    let records = rx.await.unwrap().unwrap();
    handle.wait().await;

    let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(store.records(RecordKind::Publication).len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn pipeline_without_dispatcher() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/me")
        .with_status(500)
        .create_async()
        .await;

    let result = Pipeline::new(
        ApiRequest::profile("tok").with_base_url(server.url()),
        RecordKind::Profile,
        Arc::new(transport()),
    )
    .run()
    .await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Transport);
}
