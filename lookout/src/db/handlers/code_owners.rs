//! Database repository for project CODEOWNERS records.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::code_owners::{CodeOwnersCreateDBRequest, CodeOwnersDBResponse, CodeOwnersUpdateDBRequest};
use crate::types::{CodeMappingId, CodeOwnersId, ProjectId};

pub struct CodeOwners<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CodeOwners<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch a record only if it belongs to `project_id`.
    #[instrument(skip(self), err)]
    pub async fn get_for_project(&mut self, id: CodeOwnersId, project_id: ProjectId) -> Result<Option<CodeOwnersDBResponse>> {
        let record = sqlx::query_as::<_, CodeOwnersDBResponse>("SELECT * FROM project_codeowners WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record)
    }

    /// The record (if any) that already uses a code mapping
    #[instrument(skip(self), err)]
    pub async fn get_by_code_mapping(&mut self, code_mapping_id: CodeMappingId) -> Result<Option<CodeOwnersDBResponse>> {
        let record = sqlx::query_as::<_, CodeOwnersDBResponse>("SELECT * FROM project_codeowners WHERE code_mapping_id = $1")
            .bind(code_mapping_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record)
    }

    #[instrument(skip(self, request), fields(project_id = request.project_id, code_mapping_id = request.code_mapping_id), err)]
    pub async fn create(&mut self, request: &CodeOwnersCreateDBRequest) -> Result<CodeOwnersDBResponse> {
        let record = sqlx::query_as::<_, CodeOwnersDBResponse>(
            r#"
            INSERT INTO project_codeowners (project_id, code_mapping_id, raw, schema)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(request.code_mapping_id)
        .bind(&request.raw)
        .bind(&request.schema)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: CodeOwnersId, request: &CodeOwnersUpdateDBRequest) -> Result<CodeOwnersDBResponse> {
        let record = sqlx::query_as::<_, CodeOwnersDBResponse>(
            r#"
            UPDATE project_codeowners
            SET
                code_mapping_id = COALESCE($2, code_mapping_id),
                raw = COALESCE($3, raw),
                schema = COALESCE($4, schema),
                date_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.code_mapping_id)
        .bind(request.raw.as_deref())
        .bind(request.schema.as_ref())
        .fetch_optional(&mut *self.db)
        .await?;

        record.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: CodeOwnersId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_codeowners WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_for_project_requires_matching_project(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", Some("javascript")).await;
        let other = create_test_project(&pool, &org, "api", Some("python")).await;
        let mapping = create_test_code_mapping(&pool, &project, "", "").await;
        let record = create_test_code_owners(&pool, &project, &mapping, "").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = CodeOwners::new(&mut conn);

        assert!(repo.get_for_project(record.id, project.id).await.unwrap().is_some());
        assert!(repo.get_for_project(record.id, other.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_unset_fields(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let mapping = create_test_code_mapping(&pool, &project, "", "").await;
        let record = create_test_code_owners(&pool, &project, &mapping, "* @acme/web").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = CodeOwners::new(&mut conn);

        let updated = repo
            .update(
                record.id,
                &CodeOwnersUpdateDBRequest {
                    schema: Some(json!({"$version": 1, "rules": []})),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.raw, "* @acme/web");
        assert_eq!(updated.code_mapping_id, mapping.id);
        assert!(updated.date_updated >= record.date_updated);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_code_mapping_can_only_be_used_once(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let mapping = create_test_code_mapping(&pool, &project, "", "").await;
        create_test_code_owners(&pool, &project, &mapping, "").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = CodeOwners::new(&mut conn);
        let err = repo
            .create(&CodeOwnersCreateDBRequest {
                project_id: project.id,
                code_mapping_id: mapping.id,
                raw: String::new(),
                schema: json!({}),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let first = create_test_code_mapping(&pool, &project, "", "").await;
        let second = create_test_code_mapping(&pool, &project, "src/", "app/").await;
        let a = create_test_code_owners(&pool, &project, &first, "").await;
        let b = create_test_code_owners(&pool, &project, &second, "").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = CodeOwners::new(&mut conn);

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());

        assert!(repo.get_for_project(a.id, project.id).await.unwrap().is_none());
        assert!(repo.get_for_project(b.id, project.id).await.unwrap().is_some());
        // The mapping is free again
        assert!(repo.get_by_code_mapping(first.id).await.unwrap().is_none());
    }
}
