//! Database repositories for issue groups, events and the group inbox.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::events::{
    EventCreateDBRequest, EventDBResponse, GroupDBResponse, GroupInboxDBResponse, GroupInboxReason, GroupUpsertDBRequest,
};
use crate::types::ProjectId;

pub struct Groups<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Find the group for a fingerprint, creating it on first sight. Existing groups get
    /// `times_seen` bumped and `last_seen` moved forward.
    #[instrument(skip(self, request), fields(project_id = request.project_id, fingerprint = %request.fingerprint), err)]
    pub async fn upsert_by_fingerprint(&mut self, request: &GroupUpsertDBRequest) -> Result<GroupDBResponse> {
        let group = sqlx::query_as::<_, GroupDBResponse>(
            r#"
            INSERT INTO groups (project_id, fingerprint, title, culprit, platform, level, first_seen, last_seen)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (project_id, fingerprint) DO UPDATE SET
                times_seen = groups.times_seen + 1,
                last_seen = GREATEST(groups.last_seen, EXCLUDED.last_seen)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(&request.fingerprint)
        .bind(&request.title)
        .bind(request.culprit.as_deref())
        .bind(&request.platform)
        .bind(&request.level)
        .bind(request.seen_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(group)
    }
}

pub struct Events<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Events<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(event_id = %request.event_id, group_id = request.group_id), err)]
    pub async fn create(&mut self, request: &EventCreateDBRequest) -> Result<EventDBResponse> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            r#"
            INSERT INTO events (event_id, project_id, group_id, platform, title, message, culprit, tags, data, date_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request.event_id)
        .bind(request.project_id)
        .bind(request.group_id)
        .bind(&request.platform)
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.culprit.as_deref())
        .bind(&request.tags)
        .bind(&request.data)
        .bind(request.date_created)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(event)
    }

    #[instrument(skip(self), err)]
    pub async fn count_for_project(&mut self, project_id: ProjectId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

/// Append-only log of groups waiting for triage
pub struct GroupInbox<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GroupInbox<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, reason_details), err)]
    pub async fn add(
        &mut self,
        group: &GroupDBResponse,
        reason: GroupInboxReason,
        reason_details: Option<serde_json::Value>,
    ) -> Result<GroupInboxDBResponse> {
        let entry = sqlx::query_as::<_, GroupInboxDBResponse>(
            r#"
            INSERT INTO group_inbox (group_id, project_id, reason, reason_details)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(group.id)
        .bind(group.project_id)
        .bind(reason)
        .bind(reason_details)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// Newest first
    #[instrument(skip(self), err)]
    pub async fn list_for_project(&mut self, project_id: ProjectId) -> Result<Vec<GroupInboxDBResponse>> {
        let entries = sqlx::query_as::<_, GroupInboxDBResponse>(
            "SELECT * FROM group_inbox WHERE project_id = $1 ORDER BY date_added DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }
}
