//! Analytics reporting.
//!
//! The funnel reports what the visitor does to an injected [`Analytics`]
//! sink. Reporting is best-effort: nothing is acknowledged, nothing is
//! retried, and a sink that is unavailable is simply skipped.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Category attached to every event.
pub const EVENT_CATEGORY: &str = "FlourCraft_Quiz";

/// Labels identifying which part of the funnel reported an event.
pub mod labels {
    pub const FUNNEL: &str = "Quiz_Funnel";
    pub const STEPS: &str = "Quiz_Steps";
    pub const OFFER: &str = "Offer_Page";
}

/// Event names.
pub mod events {
    pub const QUIZ_STARTED: &str = "quiz_started";
    pub const GENDER_SELECTED: &str = "gender_selected";
    pub const STEP_COMPLETED: &str = "quiz_step_completed";
    pub const EMAIL_COLLECTED: &str = "email_collected";
    pub const NAME_COLLECTED: &str = "name_collected";
    pub const QUIZ_COMPLETED: &str = "quiz_completed";
    pub const OFFER_VIEWED: &str = "offer_page_viewed";
    pub const PURCHASE_CLICKED: &str = "purchase_button_clicked";
}

/// A scalar event parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl From<&str> for EventValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for EventValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for EventValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for EventValue {
    fn from(v: usize) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for EventValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for EventValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// One reported event: a name and a flat map of scalar parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEvent {
    pub name: String,
    pub client_id: Uuid,
    pub params: BTreeMap<String, EventValue>,
    pub timestamp: DateTime<Utc>,
}

impl TrackedEvent {
    pub fn new(name: impl Into<String>, client_id: Uuid) -> Self {
        Self {
            name: name.into(),
            client_id,
            params: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<EventValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&EventValue> {
        self.params.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(EventValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.params.get(key) {
            Some(EventValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

/// Capability to receive analytics events.
pub trait Analytics: Send + Sync {
    /// Whether the sink can currently take events.
    fn is_available(&self) -> bool {
        true
    }

    /// Record an event. Must not block and must not fail.
    fn track(&self, event: TrackedEvent);
}

/// Sink for environments without analytics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn is_available(&self) -> bool {
        false
    }

    fn track(&self, _event: TrackedEvent) {}
}

/// Sink that writes events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnalytics;

impl Analytics for LogAnalytics {
    fn track(&self, event: TrackedEvent) {
        let params = serde_json::to_string(&event.params).unwrap_or_default();
        info!(
            event = %event.name,
            client_id = %event.client_id,
            params = %params,
            "Analytics event"
        );
    }
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    events: Mutex<Vec<TrackedEvent>>,
}

impl MemoryAnalytics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name == name).count()
    }
}

impl Analytics for MemoryAnalytics {
    fn track(&self, event: TrackedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Settings for the GA4 measurement protocol sink.
#[derive(Clone)]
pub struct MeasurementConfig {
    pub measurement_id: String,
    pub api_secret: SecretString,
    pub endpoint: String,
    pub queue_capacity: usize,
}

impl std::fmt::Debug for MeasurementConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementConfig")
            .field("measurement_id", &self.measurement_id)
            .field("api_secret", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

/// Default GA4 collection endpoint.
pub const MEASUREMENT_ENDPOINT: &str = "https://www.google-analytics.com/mp/collect";

/// Sink that forwards events to the GA4 measurement protocol.
///
/// `track` only enqueues; a background task posts each event. When the
/// queue is full the event is dropped.
pub struct MeasurementProtocolAnalytics {
    sender: mpsc::Sender<TrackedEvent>,
}

impl MeasurementProtocolAnalytics {
    /// Create the sink and spawn its forwarder. Needs a tokio runtime.
    pub fn spawn(config: MeasurementConfig) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for analytics");
                reqwest::Client::new()
            });

        tokio::spawn(forward_events(client, config, receiver));
        info!("Measurement protocol analytics initialized");

        Arc::new(Self { sender })
    }
}

impl Analytics for MeasurementProtocolAnalytics {
    fn is_available(&self) -> bool {
        !self.sender.is_closed()
    }

    fn track(&self, event: TrackedEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Analytics event dropped: {}", e);
        }
    }
}

async fn forward_events(
    client: reqwest::Client,
    config: MeasurementConfig,
    mut receiver: mpsc::Receiver<TrackedEvent>,
) {
    while let Some(event) = receiver.recv().await {
        let body = serde_json::json!({
            "client_id": event.client_id.to_string(),
            "timestamp_micros": event.timestamp.timestamp_micros(),
            "events": [{ "name": event.name, "params": event.params }],
        });
        let result = client
            .post(&config.endpoint)
            .query(&[
                ("measurement_id", config.measurement_id.as_str()),
                ("api_secret", config.api_secret.expose_secret()),
            ])
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(event = %event.name, "Analytics event delivered");
            }
            Ok(resp) => warn!(event = %event.name, status = %resp.status(), "Analytics rejected event"),
            Err(e) => warn!(event = %event.name, error = %e, "Analytics delivery failed"),
        }
    }
    debug!("Analytics forwarder stopped");
}

/// Stamps events with category, label and client id before handing them to
/// the sink, skipping the sink when it is unavailable.
#[derive(Clone)]
pub struct EventReporter {
    sink: Arc<dyn Analytics>,
    client_id: Uuid,
    label: &'static str,
}

impl EventReporter {
    pub fn new(sink: Arc<dyn Analytics>, client_id: Uuid) -> Self {
        Self {
            sink,
            client_id,
            label: labels::FUNNEL,
        }
    }

    /// Same sink and client, different label.
    pub fn labelled(&self, label: &'static str) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            client_id: self.client_id,
            label,
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    /// Start an event pre-filled with category and label.
    pub fn event(&self, name: &str) -> TrackedEvent {
        TrackedEvent::new(name, self.client_id)
            .with("event_category", EVENT_CATEGORY)
            .with("event_label", self.label)
    }

    pub fn report(&self, event: TrackedEvent) {
        if !self.sink.is_available() {
            return;
        }
        debug!(event = %event.name, label = self.label, "Reporting event");
        self.sink.track(event);
    }
}
