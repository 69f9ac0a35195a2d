//! Tests for ApiClient, against a scripted transport and a real HTTP mock

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use flownote::application::services::ApiClient;
use flownote::application::ApplicationError;
use flownote::config::Settings;
use flownote::exitcode;
use flownote::infrastructure::traits::ReqwestTransport;
use flownote::util::testing::{init_test_setup, FakeTransport};

fn settings(api_url: &str, token: Option<&str>) -> Arc<Settings> {
    Arc::new(Settings {
        api_url: api_url.to_string(),
        api_token: token.map(str::to_string),
        ..Settings::default()
    })
}

#[test]
fn given_token_when_request_then_sends_bearer_and_query_envelope() {
    // Arrange
    init_test_setup();
    let transport = Arc::new(FakeTransport::new().reply(json!({ "data": { "ok": true } })));
    let client = ApiClient::new(transport.clone(), settings("http://api.test/graphql", Some("s3cret")));

    // Act
    let data = client
        .request("query { ok }", json!({ "id": "1" }))
        .unwrap();

    // Assert
    assert_eq!(data, json!({ "ok": true }));
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://api.test/graphql");
    assert_eq!(
        requests[0].body,
        json!({ "query": "query { ok }", "variables": { "id": "1" } })
    );
    assert!(requests[0]
        .headers
        .contains(&("Authorization".to_string(), "Bearer s3cret".to_string())));
}

#[test]
fn given_no_token_when_request_then_omits_authorization() {
    // Arrange
    init_test_setup();
    let transport = Arc::new(FakeTransport::new().reply(json!({ "data": {} })));
    let client = ApiClient::new(transport.clone(), settings("http://api.test/graphql", None));

    // Act
    client.request("query { ok }", json!({})).unwrap();

    // Assert
    assert!(!transport.requests()[0]
        .headers
        .iter()
        .any(|(name, _)| name == "Authorization"));
}

#[test]
fn given_errors_array_when_request_then_fails_with_first_message() {
    // Arrange
    init_test_setup();
    let transport = Arc::new(FakeTransport::new().reply(json!({
        "data": null,
        "errors": [{ "message": "dataset not visible" }, { "message": "second" }]
    })));
    let client = ApiClient::new(transport, settings("http://api.test/graphql", None));

    // Act
    let err = client.request("query { ok }", json!({})).unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::Api { .. }));
    assert_eq!(err.to_string(), "dataset not visible");
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_unreachable_transport_when_request_then_local_failure() {
    // Arrange
    init_test_setup();
    let client = ApiClient::new(
        Arc::new(FakeTransport::new()),
        settings("http://api.test/graphql", None),
    );

    // Act
    let err = client.request("query { ok }", json!({})).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::FAILURE);
}

// ============================================================
// ReqwestTransport against httpmock
// ============================================================

#[test]
fn given_mock_server_when_request_over_http_then_round_trips_json() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("authorization", "Bearer s3cret")
            .json_body(json!({ "query": "query { ok }", "variables": {} }));
        then.status(200)
            .json_body(json!({ "data": { "ok": true } }));
    });
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), Some("s3cret")));

    // Act
    let data = client.request("query { ok }", json!({})).unwrap();

    // Assert
    mock.assert();
    assert_eq!(data, json!({ "ok": true }));
}

#[test]
fn given_server_error_without_json_when_request_then_local_failure() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(502).body("bad gateway");
    });
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    let err = client.request("query { ok }", json!({})).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::FAILURE);
}

#[test]
fn given_payload_url_when_download_then_writes_file() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/payload.zip");
        then.status(200).body("PK-bytes");
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("payload.zip");
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    let written = client.download(&server.url("/payload.zip"), &dest).unwrap();

    // Assert
    mock.assert();
    assert_eq!(written, 8);
    assert_eq!(std::fs::read(&dest).unwrap(), b"PK-bytes");
}

#[test]
fn given_local_file_when_upload_then_puts_contents() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT).path("/output").body("{\"cells\":[]}");
        then.status(200);
    });
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("nb.ipynb");
    std::fs::write(&src, "{\"cells\":[]}").unwrap();
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    client.upload(&server.url("/output"), &src).unwrap();

    // Assert
    mock.assert();
}

#[test]
fn given_server_error_with_json_body_when_request_then_local_failure() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(500)
            .json_body(json!({ "message": "internal error" }));
    });
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    let result = client.request("query { ok }", json!({}));

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert_eq!(err.exit_code(), exitcode::FAILURE);
}

#[test]
fn given_error_status_with_errors_array_when_request_then_api_error() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(401)
            .json_body(json!({ "data": null, "errors": [{ "message": "token expired" }] }));
    });
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    let err = client.request("query { ok }", json!({})).unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "token expired");
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_null_errors_when_request_then_returns_data() {
    // Arrange
    init_test_setup();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .json_body(json!({ "data": { "ok": true }, "errors": null }));
    });
    let transport = Arc::new(ReqwestTransport::new(None).unwrap());
    let client = ApiClient::new(transport, settings(&server.url("/graphql"), None));

    // Act
    let data = client.request("query { ok }", json!({})).unwrap();

    // Assert
    assert_eq!(data, json!({ "ok": true }));
}
