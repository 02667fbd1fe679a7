use std::sync::Arc;

use axum::{http::StatusCode as AxumStatus, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::{
    domain::{ContestId, CvrId, FileType},
    protocol::{AcvrSubmission, ContestMarks},
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use super::*;

type Captured = Arc<Mutex<Option<oneshot::Sender<Value>>>>;

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/api")
}

fn capture_route(path: &str) -> (Router, oneshot::Receiver<Value>) {
    let (tx, rx) = oneshot::channel();
    let captured: Captured = Arc::new(Mutex::new(Some(tx)));
    let app = Router::new().route(
        path,
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                if let Some(tx) = captured.lock().await.take() {
                    let _ = tx.send(body.clone());
                }
                Json(body)
            }
        }),
    );
    (app, rx)
}

fn client_for(server_url: &str) -> Arc<RlaClient> {
    RlaClient::with_timeout(server_url, Duration::from_secs(5)).expect("client")
}

fn drain_actions(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<String> {
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Action(action) = event {
            names.push(action.to_string());
        }
    }
    names
}

#[tokio::test]
async fn delete_file_posts_file_type_and_dispatches_ok() {
    let (app, body_rx) = capture_route("/api/delete-file");
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    let mut events = client.subscribe_events();

    let outcome = client
        .delete_file(FileType::CvrExport)
        .await
        .expect("delete file");

    assert!(outcome.accepted);
    assert_eq!(body_rx.await.expect("body"), json!({ "fileType": "cvr" }));
    assert_eq!(
        drain_actions(&mut events),
        vec!["DELETE_FILE_SEND", "DELETE_FILE_OK"]
    );
}

#[tokio::test]
async fn rejected_request_dispatches_fail_with_body() {
    let app = Router::new().route(
        "/api/ballot-not-found",
        post(|| async {
            (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({ "result": "ballot not in audit sequence" })),
            )
        }),
    );
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    let mut events = client.subscribe_events();

    let outcome = client
        .ballot_not_found(CvrId(12), None)
        .await
        .expect("server answered");

    assert!(!outcome.accepted);
    assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
    let err = outcome.error().expect("api error");
    assert_eq!(err.message, "ballot not in audit sequence");

    let mut fail_data = None;
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::Action(action) = event {
            if action.is(ActionName::BallotNotFound, ActionPhase::Fail) {
                fail_data = action.data;
            }
        }
    }
    assert_eq!(
        fail_data,
        Some(json!({ "result": "ballot not in audit sequence" }))
    );
}

#[tokio::test]
async fn non_json_response_body_becomes_empty_object() {
    let app = Router::new().route("/api/start-audit-round", post(|| async { "started" }));
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let outcome = client.start_next_round().await.expect("start round");
    assert!(outcome.accepted);
    assert_eq!(outcome.body, json!({}));
}

#[tokio::test]
async fn unreachable_server_dispatches_network_fail_and_returns_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let client = client_for(&format!("http://{addr}/api"));
    let mut events = client.subscribe_events();

    let err = client
        .delete_file(FileType::BallotManifest)
        .await
        .expect_err("connection refused");
    assert!(err.is_network());
    assert_eq!(
        drain_actions(&mut events),
        vec!["DELETE_FILE_SEND", "DELETE_FILE_NETWORK_FAIL"]
    );
}

#[tokio::test]
async fn ballot_not_found_with_comment_is_a_reaudit() {
    let (app, body_rx) = capture_route("/api/ballot-not-found");
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    client
        .ballot_not_found(CvrId(8), Some("wrong ballot pulled".to_string()))
        .await
        .expect("ballot not found");

    assert_eq!(
        body_rx.await.expect("body"),
        json!({ "id": 8, "reaudit": true, "comment": "wrong ballot pulled" })
    );
}

#[tokio::test]
async fn upload_acvr_posts_marks_keyed_by_contest() {
    let (app, body_rx) = capture_route("/api/upload-audit-cvr");
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);
    let mut events = client.subscribe_events();

    let submission = AcvrSubmission {
        auditor_board_index: 1,
        cvr_id: CvrId(42),
        audit_cvr: [(
            ContestId(3),
            ContestMarks {
                choices: vec!["Yes".to_string()],
                comments: Some("faint mark".to_string()),
                no_consensus: false,
            },
        )]
        .into_iter()
        .collect(),
        reaudit: true,
        comment: Some("second look".to_string()),
    };

    let outcome = client.upload_acvr(&submission).await.expect("upload acvr");

    assert!(outcome.accepted);
    assert_eq!(
        body_rx.await.expect("body"),
        json!({
            "auditor_board_index": 1,
            "cvr_id": 42,
            "audit_cvr": {
                "3": { "choices": ["Yes"], "comments": "faint mark", "no_consensus": false }
            },
            "reaudit": true,
            "comment": "second look"
        })
    );
    assert_eq!(
        drain_actions(&mut events),
        vec!["UPLOAD_ACVR_SEND", "UPLOAD_ACVR_OK"]
    );
}

#[tokio::test]
async fn standardize_contests_sends_contest_name_pairs() {
    let (app, body_rx) = capture_route("/api/set-contest-names");
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    client
        .standardize_contests([(ContestId(2), "Mayor".to_string())])
        .await
        .expect("standardize");

    assert_eq!(
        body_rx.await.expect("body"),
        json!([{ "contest": 2, "name": "Mayor" }])
    );
}

#[tokio::test]
async fn dashboard_refresh_parses_payload_and_issues_increasing_tickets() {
    let app = Router::new().route(
        "/api/county-dashboard",
        get(|| async {
            Json(json!({
                "id": 9,
                "audit_board_count": 1,
                "audit_boards": {
                    "0": {
                        "members": [
                            { "first_name": "Ann", "last_name": "Smith" },
                            { "first_name": "Bea", "last_name": "Jones" }
                        ],
                        "sign_in_time": "2017-11-20T15:00:00Z"
                    }
                }
            }))
        }),
    );
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let first = client.fetch_county_dashboard().await.expect("refresh");
    let second = client.county_dashboard_refresh().await.expect("refresh");

    let (RefreshOutcome::Fresh(first), RefreshOutcome::Fresh(second)) = (first, second) else {
        panic!("expected fresh payloads");
    };
    assert!(first.ticket < second.ticket);
    assert_eq!(first.payload.audit_board_count, Some(1));
    assert_eq!(first.payload.audit_boards.len(), 1);
    assert_eq!(first.payload, second.payload);
}

#[tokio::test]
async fn dashboard_refresh_with_wrong_shape_is_a_decode_error() {
    let app = Router::new().route(
        "/api/county-dashboard",
        get(|| async { Json(json!({ "audit_board_count": "three" })) }),
    );
    let server_url = spawn_server(app).await;
    let client = client_for(&server_url);

    let err = client
        .fetch_county_dashboard()
        .await
        .expect_err("schema mismatch");
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[test]
fn base_url_gains_trailing_slash_so_endpoints_nest() {
    let client = RlaClient::with_timeout("http://localhost:8888/api", Duration::from_secs(1))
        .expect("client");
    let url = client
        .endpoint(ActionName::DeleteFile)
        .expect("endpoint");
    assert_eq!(url.as_str(), "http://localhost:8888/api/delete-file");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = RlaClient::with_timeout("not a url", Duration::from_secs(1))
        .err()
        .expect("invalid url");
    assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
}
