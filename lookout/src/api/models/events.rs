//! API response models for events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::models::events::EventDBResponse;
use crate::types::event_id_hex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventTag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Event id as 32 hex characters
    pub id: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "groupID")]
    pub group_id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub platform: String,
    pub title: String,
    pub message: String,
    pub culprit: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_received: DateTime<Utc>,
    pub tags: Vec<EventTag>,
    /// Event interfaces (exception, request, ...)
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<Value>,
    /// Remaining event payload (user, contexts, ...)
    #[schema(value_type = Object)]
    pub context: Value,
}

/// Tags are stored as `[[key, value], ...]`
fn tags_from_json(tags: &Value) -> Vec<EventTag> {
    tags.as_array()
        .into_iter()
        .flatten()
        .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([Value::String(key), Value::String(value)]) => Some(EventTag {
                key: key.clone(),
                value: value.clone(),
            }),
            _ => None,
        })
        .collect()
}

impl From<EventDBResponse> for EventResponse {
    fn from(event: EventDBResponse) -> Self {
        let id = event_id_hex(&event.event_id);
        let mut data = match event.data {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        let entries = match data.remove("entries") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };

        Self {
            id: id.clone(),
            event_id: id,
            group_id: event.group_id.to_string(),
            project_id: event.project_id.to_string(),
            platform: event.platform,
            title: event.title,
            message: event.message,
            culprit: event.culprit,
            date_created: event.date_created,
            date_received: event.date_received,
            tags: tags_from_json(&event.tags),
            entries,
            context: Value::Object(data),
        }
    }
}
