//! Database models for issue groups, events and the group inbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{EventId, GroupId, ProjectId};

#[derive(Debug, Clone, FromRow)]
pub struct GroupDBResponse {
    pub id: GroupId,
    pub project_id: ProjectId,
    pub fingerprint: String,
    pub title: String,
    pub culprit: Option<String>,
    pub platform: Option<String>,
    pub level: String,
    pub times_seen: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GroupUpsertDBRequest {
    pub project_id: ProjectId,
    pub fingerprint: String,
    pub title: String,
    pub culprit: Option<String>,
    pub platform: String,
    pub level: String,
    pub seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventDBResponse {
    pub id: i64,
    pub event_id: EventId,
    pub project_id: ProjectId,
    pub group_id: GroupId,
    pub platform: String,
    pub title: String,
    pub message: String,
    pub culprit: Option<String>,
    pub tags: serde_json::Value,
    pub data: serde_json::Value,
    pub date_created: DateTime<Utc>,
    pub date_received: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventCreateDBRequest {
    pub event_id: EventId,
    pub project_id: ProjectId,
    pub group_id: GroupId,
    pub platform: String,
    pub title: String,
    pub message: String,
    pub culprit: Option<String>,
    pub tags: serde_json::Value,
    pub data: serde_json::Value,
    pub date_created: DateTime<Utc>,
}

/// Why a group landed in the inbox. Stored as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum GroupInboxReason {
    New = 0,
    Unignored = 1,
    Regression = 2,
    Manual = 3,
    Reprocessed = 4,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupInboxDBResponse {
    pub id: i64,
    pub group_id: GroupId,
    pub project_id: ProjectId,
    pub reason: GroupInboxReason,
    pub reason_details: Option<serde_json::Value>,
    pub date_added: DateTime<Utc>,
}
