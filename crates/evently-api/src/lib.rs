//! Event booking HTTP API backed by an in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: u32,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub capacity: u32,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u32,
    events: BTreeMap<u32, Event>,
    // booking order preserved per event; one entry per user
    bookings: BTreeMap<u32, Vec<u64>>,
}

#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event directly, bypassing request validation. Returns its id.
    pub async fn insert_event(
        &self,
        title: &str,
        starts_at: DateTime<Utc>,
        location: &str,
        capacity: u32,
    ) -> u32 {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let id = store.next_id;
        store.events.insert(
            id,
            Event {
                id,
                title: title.to_string(),
                starts_at,
                location: location.to_string(),
                capacity,
            },
        );
        id
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello World!" }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:event_id", get(get_event).post(join_event))
        .route("/events/cancel/:event_id", delete(cancel_booking))
        .with_state(state)
}

fn error_body(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({ "error": message })))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let store = state.store.read().await;
    let now = Utc::now();
    let mut events: Vec<Event> = store
        .events
        .values()
        .filter(|e| e.starts_at > now)
        .cloned()
        .collect();

    if let Some(sort_by) = query.sort_by.as_deref() {
        match sort_by {
            "asc" => events.sort_by_key(|e| e.starts_at),
            "desc" => {
                events.sort_by_key(|e| e.starts_at);
                events.reverse();
            }
            "location" => events.sort_by(|a, b| a.location.cmp(&b.location)),
            other => {
                return error_body(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid sortBy: {}", other),
                )
                .into_response();
            }
        }
    }

    Json(serde_json::json!({ "events": events })).into_response()
}

#[derive(Debug, Serialize)]
struct EventDetail {
    #[serde(flatten)]
    event: Event,
    booked: usize,
    remaining: i64,
    percent_capacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct DetailQuery {
    users: Option<String>,
}

async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<u32>,
    Query(query): Query<DetailQuery>,
) -> axum::response::Response {
    let store = state.store.read().await;
    let Some(event) = store.events.get(&event_id) else {
        return error_body(StatusCode::NOT_FOUND, "Event Not Found").into_response();
    };

    let booked_users = store.bookings.get(&event_id).cloned().unwrap_or_default();
    let booked = booked_users.len();
    let remaining = i64::from(event.capacity) - booked as i64;
    let percent_capacity = if event.capacity == 0 {
        0.0
    } else {
        booked as f64 / f64::from(event.capacity) * 100.0
    };

    let detail = EventDetail {
        event: event.clone(),
        booked,
        remaining,
        percent_capacity,
        users: query.users.map(|_| booked_users),
    };
    Json(detail).into_response()
}

#[derive(Debug, Deserialize)]
struct NewEvent {
    title: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    location: Option<String>,
    capacity: Option<i64>,
}

async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<NewEvent>,
) -> axum::response::Response {
    let (Some(title), Some(starts_at), Some(location), Some(capacity)) =
        (body.title, body.starts_at, body.location, body.capacity)
    else {
        return error_body(StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    if starts_at < Utc::now() {
        return error_body(StatusCode::BAD_REQUEST, "Cannot create event in the past")
            .into_response();
    }
    if capacity <= 0 {
        return error_body(StatusCode::BAD_REQUEST, "Capacity must be greater than 0")
            .into_response();
    }

    let id = state
        .insert_event(&title, starts_at, &location, capacity as u32)
        .await;
    tracing::info!(target: "api", "created event {} ({})", id, title);
    "ok".into_response()
}

#[derive(Debug, Deserialize)]
struct BookingBody {
    user_id: Option<u64>,
}

async fn join_event(
    State(state): State<AppState>,
    Path(event_id): Path<u32>,
    Json(body): Json<BookingBody>,
) -> axum::response::Response {
    let Some(user_id) = body.user_id else {
        return error_body(StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    // Single write lock covers the check-and-insert, so two bookings for the
    // same slot cannot interleave.
    let mut store = state.store.write().await;
    let Some(event) = store.events.get(&event_id) else {
        return error_body(StatusCode::NOT_FOUND, "Event Not Found").into_response();
    };
    let capacity = event.capacity as usize;
    let starts_at = event.starts_at;

    let booked = store.bookings.entry(event_id).or_default();
    if booked.contains(&user_id) {
        return error_body(StatusCode::CONFLICT, "Already Booked").into_response();
    }
    if starts_at < Utc::now() {
        return error_body(StatusCode::CONFLICT, "Cannot Join for past event").into_response();
    }
    if booked.len() >= capacity {
        return error_body(StatusCode::CONFLICT, "Event is full").into_response();
    }

    booked.push(user_id);
    "ok".into_response()
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(event_id): Path<u32>,
    Json(body): Json<BookingBody>,
) -> axum::response::Response {
    let Some(user_id) = body.user_id else {
        return error_body(StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    let mut store = state.store.write().await;
    let Some(booked) = store.bookings.get_mut(&event_id) else {
        return error_body(StatusCode::NOT_FOUND, "Booking Not Found").into_response();
    };
    let Some(pos) = booked.iter().position(|&u| u == user_id) else {
        return error_body(StatusCode::NOT_FOUND, "Booking Not Found").into_response();
    };
    booked.remove(pos);
    "ok".into_response()
}
