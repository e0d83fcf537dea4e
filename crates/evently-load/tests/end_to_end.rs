use chrono::{Duration, Utc};
use evently_api::{app_with_state, AppState};
use evently_common::config::EventlyConfig;

// Full pipeline: the driver fires unique user ids at a real booking server,
// so once the event fills up every further join returns 409.
#[tokio::test]
async fn load_run_fills_event_then_conflicts() {
    let state = AppState::new();
    let event_id = state
        .insert_event("Launch Party", Utc::now() + Duration::days(1), "Amsterdam", 50)
        .await;

    let app = app_with_state(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let cfg = EventlyConfig {
        base_url: format!("http://{}:{}", addr.ip(), addr.port()),
        event_id,
        total_requests: 80,
        concurrency: 20,
        port: 0,
    };
    let report = evently_load::run(&cfg).await.unwrap();

    assert_eq!(report.success, 50);
    assert_eq!(report.conflict, 30);
    assert_eq!(report.failure, 0);
    assert_eq!(report.success + report.conflict + report.failure, 80);
}
