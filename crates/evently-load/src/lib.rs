//! Bounded-concurrency load driver for the booking endpoint.
//!
//! Issues one POST per synthetic user, capped by a counting semaphore, and
//! tallies outcomes into three lock-free counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use evently_common::config::EventlyConfig;
use evently_common::{EventlyError, Result};
use reqwest::StatusCode;
use tokio::sync::Semaphore;

/// Terminal state of one request task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Conflict,
    Failure,
}

/// Maps an HTTP status to its tally bucket: 200 is a booked slot, 409 is a
/// booking conflict, everything else counts as a failure.
pub fn classify(status: StatusCode) -> Outcome {
    match status {
        StatusCode::OK => Outcome::Success,
        StatusCode::CONFLICT => Outcome::Conflict,
        _ => Outcome::Failure,
    }
}

/// Shared outcome counters. Each task records exactly once, so the three
/// buckets always sum to the number of finished tasks.
#[derive(Debug, Default)]
pub struct Tally {
    success: AtomicU64,
    conflict: AtomicU64,
    failure: AtomicU64,
}

impl Tally {
    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.success,
            Outcome::Conflict => &self.conflict,
            Outcome::Failure => &self.failure,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn conflict(&self) -> u64 {
        self.conflict.load(Ordering::Relaxed)
    }

    pub fn failure(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.success() + self.conflict() + self.failure()
    }
}

/// Aggregate results of one load run.
#[derive(Debug)]
pub struct Report {
    pub total_requests: usize,
    pub success: u64,
    pub conflict: u64,
    pub failure: u64,
    pub elapsed: Duration,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Load Test Results =====")?;
        writeln!(f, "Total Requests: {}", self.total_requests)?;
        writeln!(f, "Success (200): {}", self.success)?;
        writeln!(f, "Conflict (409): {}", self.conflict)?;
        writeln!(f, "Failures: {}", self.failure)?;
        write!(f, "Time Taken: {:?}", self.elapsed)
    }
}

/// Runs the full load: `total_requests` POSTs to
/// `{base_url}/events/{event_id}`, at most `concurrency` in flight at once.
/// Waits for every task before reporting, regardless of individual outcomes.
pub async fn run(cfg: &EventlyConfig) -> Result<Report> {
    let client = reqwest::Client::new();
    let url = format!("{}/events/{}", cfg.base_url, cfg.event_id);
    let tally = Arc::new(Tally::default());
    let semaphore = Arc::new(Semaphore::new(cfg.concurrency));

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(cfg.total_requests);
    for user_id in 1..=cfg.total_requests as u64 {
        // Acquire before spawning so no more than `concurrency` tasks exist
        // in flight; the permit rides inside the task and drops on every
        // exit path.
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EventlyError::SemaphoreClosed)?;
        let client = client.clone();
        let url = url.clone();
        let tally = tally.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let body = serde_json::json!({ "user_id": user_id });
            match client.post(&url).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    tally.record(classify(status));
                    tracing::info!("User {}: {}", user_id, status);
                }
                Err(err) => {
                    tally.record(Outcome::Failure);
                    tracing::error!("User {}: {}", user_id, err);
                }
            }
        }));
    }

    for task in tasks {
        if task.await.is_err() {
            // A panicked task never recorded its outcome; count it so the
            // buckets still sum to total_requests.
            tally.record(Outcome::Failure);
        }
    }
    let elapsed = start.elapsed();

    Ok(Report {
        total_requests: cfg.total_requests,
        success: tally.success(),
        conflict: tally.conflict(),
        failure: tally.failure(),
        elapsed,
    })
}
