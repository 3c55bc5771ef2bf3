//! End-to-end provider tests
//!
//! Drives `ProviderServer<SpeechmaticsProvider>` against a mocked
//! Speechmatics API: configure, credential validation, precedence of
//! attributes over environment variables, and resource / data source calls.

use std::collections::HashMap;
use std::env;

use serde_json::json;
use serial_test::serial;
use speechmatics_plugin_api::{LifecycleState, ObjectValue, ProviderServer};
use speechmatics_provider::SpeechmaticsProvider;
use speechmatics_provider::config::{ENV_API_KEY, ENV_ENDPOINT};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TRANSCRIPTION: &str = "speechmatics_transcription";
const JOBS: &str = "speechmatics_jobs";

fn server_with_env(vars: &[(&str, &str)]) -> ProviderServer<SpeechmaticsProvider> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ProviderServer::new(
        SpeechmaticsProvider::new("test").with_env_lookup(move |name| vars.get(name).cloned()),
    )
}

/// Accept the credential probe only for `key`.
async fn mount_probe(mock: &MockServer, key: &str) {
    Mock::given(method("GET"))
        .and(path("/v2/jobs"))
        .and(header("authorization", format!("Bearer {key}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobs": []})))
        .mount(mock)
        .await;
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "created_at": "2024-05-01T10:00:00.000Z",
        "data_name": "meeting.wav",
        "duration": 12.2,
        "status": status,
        "config": {
            "type": "transcription",
            "fetch_data": {"url": "https://example.com/meeting.wav"},
            "transcription_config": {"language": "en"}
        }
    })
}

// =============================================================================
// Configure
// =============================================================================

#[tokio::test]
async fn test_configure_success_publishes_client() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "good-key").await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"jobs": [job_json("j1", "done")]})),
        )
        .with_priority(1)
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "good-key"),
        )
        .await;
    assert!(!diags.has_error(), "{diags}");
    assert_eq!(server.state(), LifecycleState::Configured);

    let result = server
        .read_data_source(JOBS, ObjectValue::new().with("limit", 1i64))
        .await
        .unwrap();
    assert_eq!(result.get("id").as_str(), Some("speechmatics_jobs"));
    let jobs = result.get("jobs").to_json();
    assert_eq!(jobs[0]["id"], "j1");
    assert_eq!(jobs[0]["language"], "en");
    assert_eq!(jobs[0]["duration"], 12);
    assert_eq!(jobs[0]["job_type"], "transcription");
}

#[tokio::test]
async fn test_failed_reconfigure_drops_previous_client() {
    let first = MockServer::start().await;
    mount_probe(&first, "good-key").await;
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Permission Denied"})),
        )
        .mount(&second)
        .await;

    let server = server_with_env(&[]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", first.uri())
                .with("api_key", "good-key"),
        )
        .await;
    assert!(!diags.has_error(), "{diags}");
    assert_eq!(server.state(), LifecycleState::Configured);

    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", second.uri())
                .with("api_key", "bad-key"),
        )
        .await;
    assert_eq!(
        diags.errors().next().unwrap().summary,
        "Unable to validate Speechmatics credentials"
    );
    assert_eq!(server.state(), LifecycleState::Unconfigured);

    let err = server
        .read_data_source(JOBS, ObjectValue::new())
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured provider");

    let requests = first.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1, "only the first probe reaches the first endpoint");
}

#[tokio::test]
async fn test_non_200_probe_blocks_publication() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"code": 401, "error": "Permission Denied"})),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "bad-key"),
        )
        .await;

    assert!(diags.has_error());
    let d = diags.errors().next().unwrap();
    assert_eq!(d.summary, "Unable to validate Speechmatics credentials");
    assert!(d.detail.contains("Permission Denied"));
    assert_eq!(server.state(), LifecycleState::Unconfigured);

    let err = server
        .read_data_source(JOBS, ObjectValue::new())
        .await
        .unwrap_err();
    assert_eq!(err.errors().next().unwrap().summary, "Unconfigured provider");
}

#[tokio::test]
async fn test_other_2xx_probe_blocks_publication() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "key"),
        )
        .await;
    assert!(diags.has_error());
    assert_eq!(server.state(), LifecycleState::Unconfigured);
}

#[tokio::test]
async fn test_missing_api_key_fails_schema_validation() {
    let server = server_with_env(&[(ENV_API_KEY, "env-key")]);
    let diags = server
        .configure(ObjectValue::new().with("endpoint", "https://example.com"))
        .await;
    let d = diags.errors().next().unwrap();
    assert_eq!(d.summary, "Missing required argument");
    assert_eq!(d.attribute.as_ref().unwrap().to_string(), "api_key");
}

// =============================================================================
// Precedence
// =============================================================================

#[tokio::test]
async fn test_attributes_override_environment() {
    let attr_mock = MockServer::start().await;
    let env_mock = MockServer::start().await;
    mount_probe(&attr_mock, "attr-key").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobs": []})))
        .expect(0)
        .mount(&env_mock)
        .await;

    let env_uri = env_mock.uri();
    let server = server_with_env(&[(ENV_ENDPOINT, env_uri.as_str()), (ENV_API_KEY, "env-key")]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", attr_mock.uri())
                .with("api_key", "attr-key"),
        )
        .await;
    assert!(!diags.has_error(), "{diags}");
}

#[tokio::test]
async fn test_environment_endpoint_used_when_attribute_null() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "attr-key").await;

    let uri = mock.uri();
    let server = server_with_env(&[(ENV_ENDPOINT, uri.as_str())]);
    let diags = server
        .configure(ObjectValue::new().with("api_key", "attr-key"))
        .await;
    assert!(!diags.has_error(), "{diags}");
    assert_eq!(server.state(), LifecycleState::Configured);
}

fn cleanup_env_vars() {
    unsafe {
        env::remove_var(ENV_ENDPOINT);
        env::remove_var(ENV_API_KEY);
    }
}

#[tokio::test]
#[serial]
async fn test_process_environment_fallback() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "attr-key").await;

    cleanup_env_vars();
    unsafe {
        env::set_var(ENV_ENDPOINT, mock.uri());
    }

    let server = ProviderServer::new(SpeechmaticsProvider::new("test"));
    let diags = server
        .configure(ObjectValue::new().with("api_key", "attr-key"))
        .await;

    cleanup_env_vars();
    assert!(!diags.has_error(), "{diags}");
}

// =============================================================================
// Transcription resource
// =============================================================================

#[tokio::test]
async fn test_transcription_lifecycle() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "key").await;

    Mock::given(method("POST"))
        .and(path("/v2/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "j42"})))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs/j42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job": job_json("j42", "done")})),
        )
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs/j42/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Good morning everyone."))
        .mount(&mock)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/jobs/j42"))
        .and(query_param("force", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job": job_json("j42", "deleted")})),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    let diags = server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "key"),
        )
        .await;
    assert!(!diags.has_error(), "{diags}");

    let plan = ObjectValue::new()
        .with("audio_url", "https://example.com/meeting.wav")
        .with("language", "en");
    let state = server.create_resource(TRANSCRIPTION, plan).await.unwrap();
    assert_eq!(state.get("id").as_str(), Some("j42"));
    assert_eq!(state.get("status").as_str(), Some("done"));
    assert_eq!(state.get("transcript").as_str(), Some("Good morning everyone."));
    assert_eq!(state.get("duration").as_i64(), Some(12));

    let refreshed = server
        .read_resource(TRANSCRIPTION, state.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed, state);

    let mut plan = state.clone();
    plan.set("force_delete", true);
    let updated = server
        .update_resource(TRANSCRIPTION, state.clone(), plan)
        .await
        .unwrap();
    assert_eq!(updated.get("force_delete").as_bool(), Some(true));

    server.delete_resource(TRANSCRIPTION, updated).await.unwrap();
}

#[tokio::test]
async fn test_language_change_requires_replace() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "key").await;

    let server = server_with_env(&[]);
    server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "key"),
        )
        .await;

    let prior = ObjectValue::new()
        .with("id", "j1")
        .with("audio_url", "https://example.com/a.wav")
        .with("language", "en");
    let mut plan = prior.clone();
    plan.set("language", "de");

    let err = server
        .update_resource(TRANSCRIPTION, prior, plan)
        .await
        .unwrap_err();
    assert_eq!(
        err.errors().next().unwrap().summary,
        "Resource requires replacement"
    );
}

#[tokio::test]
async fn test_read_removes_missing_and_deleted_jobs() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "key").await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Job not found"})))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/jobs/old"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job": job_json("old", "deleted")})),
        )
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "key"),
        )
        .await;

    for id in ["missing", "old"] {
        let state = ObjectValue::new()
            .with("id", id)
            .with("audio_url", "https://example.com/a.wav")
            .with("language", "en");
        let refreshed = server.read_resource(TRANSCRIPTION, state).await.unwrap();
        assert!(refreshed.is_none(), "{id}");
    }
}

#[tokio::test]
async fn test_delete_tolerates_missing_job() {
    let mock = MockServer::start().await;
    mount_probe(&mock, "key").await;
    Mock::given(method("DELETE"))
        .and(path("/v2/jobs/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let server = server_with_env(&[]);
    server
        .configure(
            ObjectValue::new()
                .with("endpoint", mock.uri())
                .with("api_key", "key"),
        )
        .await;

    let state = ObjectValue::new()
        .with("id", "gone")
        .with("audio_url", "https://example.com/a.wav")
        .with("language", "en");
    server.delete_resource(TRANSCRIPTION, state).await.unwrap();
}
