// Activity collector tests against a stubbed Tautulli API

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use ppth_exporter::exposition::{MetricSample, SampleValue};
use ppth_exporter::tautulli_repo::TautulliRepo;

#[derive(Clone)]
struct Stub {
    responses: Arc<HashMap<String, (StatusCode, String)>>,
}

async fn stub_handler(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if params.get("apikey").map(String::is_empty).unwrap_or(true) {
        return (StatusCode::UNAUTHORIZED, String::new());
    }
    let cmd = params.get("cmd").cloned().unwrap_or_default();
    match stub.responses.get(&cmd) {
        Some((status, body)) => (*status, body.clone()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// Serve canned `{response: {data: ...}}` envelopes on an ephemeral port.
async fn spawn_stub(responses: HashMap<String, (StatusCode, String)>) -> String {
    let app = Router::new().route("/api/v2", get(stub_handler)).with_state(Stub {
        responses: Arc::new(responses),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn envelope(data: serde_json::Value) -> (StatusCode, String) {
    (
        StatusCode::OK,
        serde_json::json!({"response": {"data": data}}).to_string(),
    )
}

fn full_stub_responses() -> HashMap<String, (StatusCode, String)> {
    let mut responses = HashMap::new();
    responses.insert(
        "get_activity".to_string(),
        envelope(serde_json::json!({
            "stream_count": "5",
            "stream_count_direct_play": 3,
            "stream_count_direct_stream": 1,
            "stream_count_transcode": 1,
            "total_bandwidth": 9000,
            "lan_bandwidth": 2000,
            "sessions": [
                {"username": "alice", "bitrate": "1000", "video_full_resolution": "1080"},
                {"username": "bob", "bitrate": 2000, "video_full_resolution": "1080"},
                {"username": "alice", "bitrate": "", "video_full_resolution": "4k"}
            ]
        })),
    );
    responses.insert(
        "get_server_info".to_string(),
        envelope(serde_json::json!({"pms_version": "1.40.0", "pms_platform": "Linux"})),
    );
    responses.insert(
        "get_users".to_string(),
        envelope(serde_json::json!([
            {"username": "alice"}, {"username": "bob"}, {"username": "carol"}
        ])),
    );
    responses
}

fn find<'a>(samples: &'a [MetricSample], name: &str) -> Option<&'a MetricSample> {
    samples.iter().find(|s| s.name == name)
}

#[tokio::test]
async fn collect_normalizes_full_payload() {
    let base = spawn_stub(full_stub_responses()).await;
    let repo = TautulliRepo::new(&base, "key").unwrap();
    let samples = repo.collect().await;

    assert_eq!(
        find(&samples, "plex_streams_total").unwrap().value,
        SampleValue::Int(5)
    );
    assert_eq!(
        find(&samples, "plex_streams_direct_play").unwrap().value,
        SampleValue::Int(3)
    );
    assert_eq!(
        find(&samples, "plex_streams_direct_stream").unwrap().value,
        SampleValue::Int(1)
    );
    assert_eq!(
        find(&samples, "plex_streams_transcode").unwrap().value,
        SampleValue::Int(1)
    );
    assert_eq!(
        find(&samples, "plex_bandwidth_wan").unwrap().value,
        SampleValue::Int(7000)
    );
    assert_eq!(
        find(&samples, "plex_active_users").unwrap().value,
        SampleValue::Int(2)
    );
    assert_eq!(
        find(&samples, "plex_avg_stream_bitrate").unwrap().value,
        SampleValue::Float(1500.0)
    );
    assert_eq!(
        find(&samples, "plex_total_users").unwrap().value,
        SampleValue::Int(3)
    );

    let info = find(&samples, "plex_server_info").unwrap();
    assert_eq!(info.value, SampleValue::Int(1));
    assert!(info.labels.contains(&("version", "1.40.0".to_string())));
    assert!(info.labels.contains(&("platform", "Linux".to_string())));

    let resolutions: Vec<_> = samples
        .iter()
        .filter(|s| s.name == "plex_streams_by_resolution")
        .collect();
    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0].labels, vec![("resolution", "1080".to_string())]);
    assert_eq!(resolutions[0].value, SampleValue::Int(2));
    assert_eq!(resolutions[1].labels, vec![("resolution", "4k".to_string())]);
    assert_eq!(resolutions[1].value, SampleValue::Int(1));
}

#[tokio::test]
async fn collect_emits_zeros_for_empty_activity_payload() {
    let mut responses = HashMap::new();
    responses.insert("get_activity".to_string(), envelope(serde_json::json!({})));
    let base = spawn_stub(responses).await;
    let repo = TautulliRepo::new(&base, "key").unwrap();
    let samples = repo.collect().await;

    assert_eq!(
        find(&samples, "plex_streams_total").unwrap().value,
        SampleValue::Int(0)
    );
    assert_eq!(
        find(&samples, "plex_avg_stream_bitrate").unwrap().value,
        SampleValue::Float(0.0)
    );
    // The other two sub-calls 404ed; their samples are simply absent
    assert!(find(&samples, "plex_server_info").is_none());
    assert!(find(&samples, "plex_total_users").is_none());
}

#[tokio::test]
async fn collect_isolates_failing_sub_calls() {
    let mut responses = full_stub_responses();
    responses.insert(
        "get_activity".to_string(),
        (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    );
    let base = spawn_stub(responses).await;
    let repo = TautulliRepo::new(&base, "key").unwrap();
    let samples = repo.collect().await;

    assert!(find(&samples, "plex_streams_total").is_none());
    assert!(find(&samples, "plex_bandwidth_total").is_none());
    assert!(find(&samples, "plex_server_info").is_some());
    assert_eq!(
        find(&samples, "plex_total_users").unwrap().value,
        SampleValue::Int(3)
    );
}

#[tokio::test]
async fn collect_degrades_on_malformed_payload() {
    let mut responses = full_stub_responses();
    responses.insert(
        "get_server_info".to_string(),
        (StatusCode::OK, "not json".to_string()),
    );
    let base = spawn_stub(responses).await;
    let repo = TautulliRepo::new(&base, "key").unwrap();
    let samples = repo.collect().await;

    assert!(find(&samples, "plex_server_info").is_none());
    assert!(find(&samples, "plex_streams_total").is_some());
}

#[tokio::test]
async fn collect_returns_empty_when_upstream_unreachable() {
    // Bind then drop a listener so the port is closed
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let repo = TautulliRepo::new(&format!("http://{addr}"), "key").unwrap();
    let samples = repo.collect().await;
    assert!(samples.is_empty());
}
