use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use axum::{extract::State, routing::get, routing::post, Json, Router};
use client_core::{
    reactions::{refresh_store, spawn_reactions, BALLOT_NOT_FOUND_NOTICE},
    selectors, ClientEvent, CountyStore, RlaClient, StaticRoute, WizardController, WizardStage,
};
use serde_json::{json, Value};
use shared::domain::CvrId;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    not_found_reports: Arc<AtomicU64>,
}

async fn county_dashboard(State(state): State<ServerState>) -> Json<Value> {
    if state.not_found_reports.load(Ordering::SeqCst) == 0 {
        Json(json!({
            "id": 1,
            "asm_state": "COUNTY_AUDIT_UNDERWAY",
            "audit_board_count": 1,
            "audit_boards": {
                "0": {
                    "members": [
                        { "first_name": "Ann", "last_name": "Smith" },
                        { "first_name": "Bea", "last_name": "Jones" }
                    ],
                    "sign_in_time": "2017-11-20T15:00:00Z"
                }
            },
            "current_round": { "number": 1, "expected_count": 2, "actual_count": 0 },
            "ballot_sequence_assignment": [{ "index": 0, "count": 2 }],
            "cvrs_to_audit": [101, 102],
            "audited_ballot_count": 0
        }))
    } else {
        // Round finished and the board signed out.
        Json(json!({
            "id": 1,
            "asm_state": "COUNTY_AUDIT_UNDERWAY",
            "audited_ballot_count": 2
        }))
    }
}

async fn ballot_not_found(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.not_found_reports.fetch_add(1, Ordering::SeqCst);
    Json(body)
}

async fn spawn_audit_server() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/county-dashboard", get(county_dashboard))
        .route("/api/ballot-not-found", post(ballot_not_found))
        .with_state(ServerState::default());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api"))
}

#[tokio::test]
async fn board_reports_missing_ballot_and_dashboard_follows() {
    let server_url = spawn_audit_server().await.expect("spawn server");
    let client = RlaClient::with_timeout(&server_url, Duration::from_secs(5)).expect("client");
    let store = Arc::new(Mutex::new(CountyStore::new(StaticRoute::new(
        "/county/board/0",
    ))));
    let mut events = client.subscribe_events();
    let reactions = spawn_reactions(client.clone(), store.clone());

    assert!(refresh_store(client.as_ref(), &store)
        .await
        .expect("initial refresh"));
    {
        let store = store.lock().await;
        let state = store.state();
        assert_eq!(state.audit_board_index, Some(0));
        assert_eq!(state.audit_boards.len(), 1);
        assert_eq!(state.audit_board_count, Some(1));
        assert!(selectors::can_audit(state));
        assert_eq!(selectors::total_ballots_for_board(state), Some(2));
    }

    let mut wizard = WizardController::new();
    assert_eq!(wizard.advance(), WizardStage::BallotAudit);

    let outcome = client
        .ballot_not_found(CvrId(101), None)
        .await
        .expect("report not found");
    assert!(outcome.accepted);

    let notice = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Notice(message)) => return message,
                Ok(_) => continue,
                Err(err) => panic!("event stream ended: {err}"),
            }
        }
    })
    .await
    .expect("notice in time");
    assert_eq!(notice, BALLOT_NOT_FOUND_NOTICE);

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let store = store.lock().await;
                if store.state().audited_ballot_count == Some(2) {
                    return store.state().clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("follow-up refresh applied");

    assert!(settled.audit_boards.is_empty());
    assert_eq!(settled.current_round, None);
    assert_eq!(settled.audit_board_count, None);
    assert_eq!(settled.audit_board_index, Some(0));
    assert_eq!(settled.cvrs_to_audit, Some(vec![CvrId(101), CvrId(102)]));
    assert!(!selectors::can_audit(&settled));

    reactions.abort();
}
