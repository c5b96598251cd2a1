//! Sample events.
//!
//! New projects get a realistic looking error to click through before they send real data.
//! Payloads for each supported platform are embedded from `samples/<platform>.json`.

use chrono::{DateTime, Utc};
use rust_embed::RustEmbed;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use sqlx::PgConnection;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::handlers::{Events, Groups};
use crate::db::models::events::{EventCreateDBRequest, EventDBResponse, GroupDBResponse, GroupUpsertDBRequest};
use crate::db::models::projects::ProjectDBResponse;
use crate::errors::{Error, Result};

/// Used when the project has no platform, and when a platform has no fixture
pub const DEFAULT_PLATFORM: &str = "javascript";

#[derive(RustEmbed)]
#[folder = "samples/"]
struct Fixtures;

/// Event payload as stored in a fixture file
#[derive(Debug, Clone, Deserialize)]
struct Fixture {
    title: String,
    message: String,
    culprit: Option<String>,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default)]
    tags: Vec<(String, String)>,
    /// Interfaces (`entries`, `user`, ...) kept verbatim
    #[serde(flatten)]
    data: Map<String, Value>,
}

fn default_level() -> String {
    "error".to_string()
}

/// A sample event ready to store
#[derive(Debug, Clone)]
pub struct SampleEvent {
    pub event_id: Uuid,
    pub platform: String,
    pub title: String,
    pub message: String,
    pub culprit: Option<String>,
    pub level: String,
    pub tags: Vec<(String, String)>,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl SampleEvent {
    /// Samples group with each other by platform, title and culprit
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.platform.as_bytes());
        hasher.update(b"|");
        hasher.update(self.title.as_bytes());
        hasher.update(b"|");
        hasher.update(self.culprit.as_deref().unwrap_or_default().as_bytes());
        hex(&hasher.finalize())
    }

    fn tags_json(&self) -> Value {
        Value::Array(self.tags.iter().map(|(k, v)| json!([k, v])).collect())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Platform to generate a sample for: the project's, or [`DEFAULT_PLATFORM`] if unset or empty
pub fn sample_platform(project_platform: Option<&str>) -> &str {
    match project_platform.map(str::trim) {
        Some(platform) if !platform.is_empty() => platform,
        _ => DEFAULT_PLATFORM,
    }
}

/// Fixture for a platform. `python-django` falls back to `python`, anything unknown to
/// the default platform.
fn load_fixture(platform: &str) -> Result<Fixture> {
    let base = platform.split('-').next().unwrap_or(platform);

    let file = [platform, base, DEFAULT_PLATFORM]
        .into_iter()
        .find_map(|candidate| Fixtures::get(&format!("{candidate}.json")))
        .ok_or_else(|| Error::Internal {
            operation: format!("load sample event fixture for {platform}"),
        })?;

    serde_json::from_slice(&file.data).map_err(|e| Error::Internal {
        operation: format!("parse sample event fixture for {platform}: {e}"),
    })
}

/// Build a fresh sample event for a platform
pub fn build_sample_event(platform: &str) -> Result<SampleEvent> {
    let fixture = load_fixture(platform)?;

    let mut tags = fixture.tags;
    tags.retain(|(key, _)| key != "sample_event");
    tags.push(("sample_event".to_string(), "yes".to_string()));

    Ok(SampleEvent {
        event_id: Uuid::new_v4(),
        platform: platform.to_string(),
        title: fixture.title,
        message: fixture.message,
        culprit: fixture.culprit,
        level: fixture.level,
        tags,
        data: Value::Object(fixture.data),
        timestamp: Utc::now(),
    })
}

/// Store a sample event for `project`, grouping it with earlier samples of the same kind.
///
/// Returns the stored event and its group. The caller decides what happens to the group
/// (the create-sample endpoint puts it in the inbox).
#[instrument(skip(conn, project), fields(project_id = project.id), err)]
pub async fn create_sample_event(conn: &mut PgConnection, project: &ProjectDBResponse) -> Result<(EventDBResponse, GroupDBResponse)> {
    let platform = sample_platform(project.platform.as_deref());
    let sample = build_sample_event(platform)?;

    let group = Groups::new(&mut *conn)
        .upsert_by_fingerprint(&GroupUpsertDBRequest {
            project_id: project.id,
            fingerprint: sample.fingerprint(),
            title: sample.title.clone(),
            culprit: sample.culprit.clone(),
            platform: sample.platform.clone(),
            level: sample.level.clone(),
            seen_at: sample.timestamp,
        })
        .await?;

    let event = Events::new(&mut *conn)
        .create(&EventCreateDBRequest {
            event_id: sample.event_id,
            project_id: project.id,
            group_id: group.id,
            platform: sample.platform.clone(),
            title: sample.title.clone(),
            message: sample.message.clone(),
            culprit: sample.culprit.clone(),
            tags: sample.tags_json(),
            data: sample.data.clone(),
            date_created: sample.timestamp,
        })
        .await?;

    debug!(group_id = group.id, times_seen = group.times_seen, "Created sample event {}", event.event_id);

    Ok((event, group))
}
