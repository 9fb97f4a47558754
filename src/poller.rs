//! Background poller and bridge health classification
//!
//! A single task pulls the latest sample from the sensor bridge on a fixed
//! interval, classifies the outcome into a closed fault set, and feeds
//! valid samples into the aggregation state under the shared lock. The
//! durable writes (summary row on day rollover, state snapshot on every
//! accepted ingest) happen after the lock is released, from a copy.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::sample;

/// The bridge fetch carries a short timeout so a dead bridge costs at most
/// one cycle.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Health of the sensor pipeline as observed by the poller.
///
/// `reachable` says we could talk to the bridge at all; `stream_healthy`
/// says the bridge had a fresh, parseable sample for us. Exposed verbatim
/// in the current-state snapshot.
#[derive(Debug, Clone, Default)]
pub struct BridgeHealth {
    pub reachable: bool,
    pub stream_healthy: bool,
    pub last_poll_ts: i64,
    pub last_status: u16,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl BridgeHealth {
    /// Records a successful poll that delivered a valid sample.
    pub fn mark_healthy(&mut self, now: i64, status: u16) {
        self.reachable = true;
        self.stream_healthy = true;
        self.last_poll_ts = now;
        self.last_status = status;
        self.error_code = None;
        self.error_message = None;
    }

    /// Records a classified poll fault.
    pub fn mark_fault(&mut self, now: i64, status: u16, fault: &BridgeFault) {
        self.reachable = !matches!(fault, BridgeFault::Transport(_));
        self.stream_healthy = false;
        self.last_poll_ts = now;
        self.last_status = status;
        self.error_code = Some(fault.code());
        self.error_message = fault.message();
    }
}

/// Closed set of classified poll outcomes, kept apart from the ingest path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeFault {
    /// Network/timeout failure talking to the bridge
    Transport(String),
    /// The bridge answered OK but the payload was not a sample
    GarbledPayload,
    /// The bridge reports its sensor stream has stalled
    StreamStale { message: Option<String> },
    /// The bridge has no sample yet (cold start)
    NoDataYet { message: Option<String> },
    /// Any other non-OK response
    Unclassified {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },
}

impl BridgeFault {
    /// Stable error code string exposed in the snapshot health block.
    pub fn code(&self) -> String {
        match self {
            BridgeFault::Transport(_) => "transport_error".to_string(),
            BridgeFault::GarbledPayload => "parse_error".to_string(),
            BridgeFault::StreamStale { .. } => "stale_data".to_string(),
            BridgeFault::NoDataYet { .. } => "no_data".to_string(),
            BridgeFault::Unclassified { status, code, .. } => code
                .clone()
                .unwrap_or_else(|| format!("http_{status}")),
        }
    }

    /// Human-ish description, when one exists.
    pub fn message(&self) -> Option<String> {
        match self {
            BridgeFault::Transport(msg) => Some(msg.clone()),
            BridgeFault::GarbledPayload => Some("invalid JSON from bridge".to_string()),
            BridgeFault::StreamStale { message }
            | BridgeFault::NoDataYet { message }
            | BridgeFault::Unclassified { message, .. } => message.clone(),
        }
    }
}

/// Structured error body the bridge attaches to non-OK responses.
#[derive(Debug, Deserialize)]
struct BridgeErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a non-OK response body into a classified fault.
///
/// The bridge signals a stalled sensor stream and a cold start with 503
/// plus an `error` discriminator; anything else is unclassified but keeps
/// whatever code/message the body carried.
pub fn classify_error_body(status: u16, body: &str) -> BridgeFault {
    let parsed: Option<BridgeErrorBody> =
        if body.is_empty() { None } else { serde_json::from_str(body).ok() };

    match parsed {
        Some(err) => match (status, err.error.as_deref()) {
            (503, Some("stale_data")) => BridgeFault::StreamStale {
                message: err.message,
            },
            (503, Some("no_data")) => BridgeFault::NoDataYet {
                message: err.message,
            },
            _ => BridgeFault::Unclassified {
                status,
                code: err.error,
                message: err.message,
            },
        },
        None => BridgeFault::Unclassified {
            status,
            code: None,
            message: (!body.is_empty())
                .then(|| "non-OK response with non-JSON body".to_string()),
        },
    }
}

/// Handle for the background poll task.
pub struct PollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Spawns the poll loop on the current runtime.
    pub fn spawn(app: App) -> Self {
        let interval = Duration::from_secs(app.config.poll_interval_sec.max(1));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let client = Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new());
            let mut ticker = tokio::time::interval(interval);

            info!(url = %app.config.bridge_url, "poller started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poll_once(&app, &client).await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("poller shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    /// Requests shutdown and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// One poll cycle: fetch, classify, and on success ingest + persist.
async fn poll_once(app: &App, client: &Client) {
    let now = chrono::Utc::now().timestamp();

    let response = match client.get(&app.config.bridge_url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "bridge fetch failed");
            let fault = BridgeFault::Transport(e.to_string());
            app.lock().bridge.mark_fault(now, 0, &fault);
            return;
        }
    };

    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let fault = BridgeFault::Transport(e.to_string());
            app.lock().bridge.mark_fault(now, status, &fault);
            return;
        }
    };

    handle_response(app, now, status, &body);
}

fn handle_response(app: &App, now: i64, status: u16, body: &str) {
    if !(200..300).contains(&status) || body.is_empty() {
        let fault = classify_error_body(status, body);
        app.lock().bridge.mark_fault(now, status, &fault);
        return;
    }

    let reading = match sample::parse_reading(body) {
        Ok(reading) => reading,
        Err(_) => {
            // HTTP worked, payload is garbage.
            app.lock()
                .bridge
                .mark_fault(now, status, &BridgeFault::GarbledPayload);
            return;
        }
    };

    // Mutate under the lock; copy out what the durable writes need so no
    // other mutation can interleave between the rollover decision and the
    // flush.
    let (flush, state_copy) = {
        let mut shared = app.lock();
        let flush = shared.weather.ingest(&reading, now, &app.calendar);
        shared.bridge.mark_healthy(now, status);
        (flush, shared.weather.clone())
    };

    if let Some(flush) = flush {
        match &app.store {
            Some(store) => {
                if let Err(e) = store.upsert_day(flush.day_ts, &flush.record) {
                    warn!(day_ts = flush.day_ts, error = %e, "failed to write daily summary");
                } else {
                    info!(day_ts = flush.day_ts, "daily summary written");
                }
            }
            None => warn!(
                day_ts = flush.day_ts,
                "summary store unavailable, dropping daily summary"
            ),
        }
    }

    if let Err(e) = app.persistence.save(&state_copy) {
        warn!(error = %e, "failed to persist state snapshot");
    }
}
