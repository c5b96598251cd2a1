//! Validation of CODEOWNERS updates.
//!
//! [`ProjectCodeOwnerSerializer`] turns a partial [`CodeOwnersUpdate`] payload into a
//! [`ValidatedCodeOwners`] ready to persist, or fails with [`Error::Validation`] carrying
//! messages per field. Nothing is written while validating.
//!
//! Checks, in order:
//!
//! 1. field types (`raw` is a string, `codeMappingId` an integer or integer string)
//! 2. the code mapping exists in the project and isn't used by another record
//! 3. every owner in `raw` resolves: usernames and teams through external actors, emails
//!    through organization members
//! 4. the converted issue owner rules parse

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use sqlx::PgConnection;
use tracing::{debug, instrument};

use super::ProjectOwnership;
use super::codeowners::{convert_codeowners_syntax, parse_code_owners};
use super::rules::{dump_schema, parse_rules};
use crate::PRODUCT_NAME;
use crate::api::models::code_owners::CodeOwnersUpdate;
use crate::db::handlers::{CodeMappings, CodeOwners, ExternalActors, Organizations};
use crate::db::models::code_owners::{CodeOwnersDBResponse, CodeOwnersUpdateDBRequest};
use crate::db::models::projects::{CodeMappingDBResponse, ProjectDBResponse};
use crate::errors::{Error, FieldErrors, Result};
use crate::types::CodeMappingId;

const RAW: &str = "raw";
const CODE_MAPPING_ID: &str = "codeMappingId";
const NOT_NULL: &str = "This field may not be null.";

/// What the serializer validates against
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub project: ProjectDBResponse,
    pub ownership: ProjectOwnership,
}

/// A fully validated update
#[derive(Debug, Clone)]
pub struct ValidatedCodeOwners {
    pub raw: String,
    pub code_mapping: CodeMappingDBResponse,
    pub schema: Value,
}

impl ValidatedCodeOwners {
    pub fn to_update_request(&self) -> CodeOwnersUpdateDBRequest {
        CodeOwnersUpdateDBRequest {
            code_mapping_id: Some(self.code_mapping.id),
            raw: Some(self.raw.clone()),
            schema: Some(self.schema.clone()),
        }
    }
}

pub struct ProjectCodeOwnerSerializer<'a> {
    context: &'a ValidationContext,
    instance: &'a CodeOwnersDBResponse,
}

impl<'a> ProjectCodeOwnerSerializer<'a> {
    pub fn new(context: &'a ValidationContext, instance: &'a CodeOwnersDBResponse) -> Self {
        Self { context, instance }
    }

    #[instrument(skip_all, fields(codeowners_id = self.instance.id, project_id = self.context.project.id), err)]
    pub async fn validate(&self, conn: &mut PgConnection, payload: &CodeOwnersUpdate) -> Result<ValidatedCodeOwners> {
        if self.context.ownership.project_id != self.context.project.id {
            return Err(Error::Internal {
                operation: format!(
                    "validate codeowners: ownership of project {} used for project {}",
                    self.context.ownership.project_id, self.context.project.id
                ),
            });
        }

        let (raw, code_mapping_id) = parse_fields(payload).map_err(|errors| Error::Validation { errors })?;

        let code_mapping = match code_mapping_id {
            Some(id) => self.validate_code_mapping_id(conn, id).await?,
            None => CodeMappings::new(&mut *conn)
                .get_for_project(self.instance.code_mapping_id, self.context.project.id)
                .await?
                .ok_or_else(|| Error::Internal {
                    operation: format!("load code mapping {} of codeowners {}", self.instance.code_mapping_id, self.instance.id),
                })?,
        };

        let raw = raw.unwrap_or_else(|| self.instance.raw.clone());
        if raw.trim().is_empty() {
            return Ok(ValidatedCodeOwners {
                raw,
                code_mapping,
                schema: dump_schema(&[]),
            });
        }

        let parsed = parse_code_owners(&raw);
        let associations = self.resolve_associations(conn, &parsed).await?;

        let issue_owners = convert_codeowners_syntax(&parsed, &associations, &code_mapping);
        let rules = parse_rules(&issue_owners).map_err(|message| Error::field(RAW, message))?;
        debug!("Converted {} CODEOWNERS rules into {} issue owner rules", parsed.rules.len(), rules.len());

        Ok(ValidatedCodeOwners {
            raw,
            code_mapping,
            schema: dump_schema(&rules),
        })
    }

    async fn validate_code_mapping_id(&self, conn: &mut PgConnection, id: CodeMappingId) -> Result<CodeMappingDBResponse> {
        if let Some(existing) = CodeOwners::new(&mut *conn).get_by_code_mapping(id).await?
            && existing.id != self.instance.id
        {
            return Err(Error::field(CODE_MAPPING_ID, "This code mapping is already in use."));
        }

        CodeMappings::new(&mut *conn)
            .get_for_project(id, self.context.project.id)
            .await?
            .ok_or_else(|| Error::field(CODE_MAPPING_ID, "This code mapping does not exist."))
    }

    /// Map every owner token onto its issue owner identity, or fail listing all that don't resolve
    async fn resolve_associations(
        &self,
        conn: &mut PgConnection,
        parsed: &super::codeowners::ParsedCodeOwners,
    ) -> Result<HashMap<String, String>> {
        let organization_id = self.context.project.organization_id;
        let mut associations = HashMap::new();

        let members = Organizations::new(&mut *conn)
            .members_with_emails(organization_id, &parsed.emails)
            .await?;
        let member_emails: HashSet<String> = members.iter().map(|u| u.email.to_lowercase()).collect();
        for email in &parsed.emails {
            if member_emails.contains(&email.to_lowercase()) {
                associations.insert(email.clone(), email.clone());
            }
        }

        let actors = ExternalActors::new(&mut *conn)
            .resolve(organization_id, &parsed.external_names())
            .await?;
        for actor in actors {
            if let Some(email) = actor.user_email {
                associations.insert(actor.external_name, email);
            } else if let Some(slug) = actor.team_slug {
                associations.insert(actor.external_name, format!("#{slug}"));
            }
        }

        let missing = |names: &[String]| -> Vec<String> { names.iter().filter(|n| !associations.contains_key(*n)).cloned().collect() };
        let mut messages = Vec::new();
        let missing_emails = missing(&parsed.emails);
        if !missing_emails.is_empty() {
            messages.push(format!(
                "The following emails do not have a {PRODUCT_NAME} user: {}",
                missing_emails.join(", ")
            ));
        }
        let missing_usernames = missing(&parsed.usernames);
        if !missing_usernames.is_empty() {
            messages.push(format!(
                "The following usernames do not have an association in {PRODUCT_NAME}: {}",
                missing_usernames.join(", ")
            ));
        }
        let missing_teams = missing(&parsed.teams);
        if !missing_teams.is_empty() {
            messages.push(format!(
                "The following team names do not have an association in {PRODUCT_NAME}: {}",
                missing_teams.join(", ")
            ));
        }

        if !messages.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert(RAW.to_string(), messages);
            return Err(Error::Validation { errors });
        }

        Ok(associations)
    }
}

/// Field-level checks, collecting errors for every field before failing
fn parse_fields(payload: &CodeOwnersUpdate) -> std::result::Result<(Option<String>, Option<CodeMappingId>), FieldErrors> {
    let mut errors = FieldErrors::new();

    let raw = match &payload.raw {
        None => None,
        Some(Value::Null) => {
            errors.insert(RAW.to_string(), vec![NOT_NULL.to_string()]);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.insert(RAW.to_string(), vec!["Not a valid string.".to_string()]);
            None
        }
    };

    let code_mapping_id = match &payload.code_mapping_id {
        None => None,
        Some(Value::Null) => {
            errors.insert(CODE_MAPPING_ID.to_string(), vec![NOT_NULL.to_string()]);
            None
        }
        Some(value) => match parse_id(value) {
            Some(id) => Some(id),
            None => {
                errors.insert(CODE_MAPPING_ID.to_string(), vec!["A valid integer is required.".to_string()]);
                None
            }
        },
    };

    if errors.is_empty() { Ok((raw, code_mapping_id)) } else { Err(errors) }
}

fn parse_id(value: &Value) -> Option<CodeMappingId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::*;
    use serde_json::json;
    use sqlx::PgPool;

    fn payload(value: Value) -> CodeOwnersUpdate {
        CodeOwnersUpdate::from_json(value).unwrap()
    }

    #[test]
    fn test_parse_fields_collects_all_type_errors() {
        let errors = parse_fields(&payload(json!({"raw": 12, "codeMappingId": "abc"}))).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["raw"], vec!["Not a valid string."]);
        assert_eq!(errors["codeMappingId"], vec!["A valid integer is required."]);
    }

    #[test]
    fn test_parse_fields_rejects_nulls() {
        let errors = parse_fields(&payload(json!({"raw": null, "codeMappingId": null}))).unwrap_err();
        assert_eq!(errors["raw"], vec!["This field may not be null."]);
        assert_eq!(errors["codeMappingId"], vec!["This field may not be null."]);
    }

    #[test]
    fn test_parse_fields_accepts_string_and_integer_ids() {
        assert_eq!(parse_fields(&payload(json!({"codeMappingId": "42"}))).unwrap(), (None, Some(42)));
        assert_eq!(parse_fields(&payload(json!({"codeMappingId": 7}))).unwrap(), (None, Some(7)));
        assert_eq!(parse_fields(&payload(json!({}))).unwrap(), (None, None));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_validate_builds_schema_from_associations(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let mapping = create_test_code_mapping(&pool, &project, "src/", "app/").await;
        let record = create_test_code_owners(&pool, &project, &mapping, "").await;
        let user = create_test_user(&pool, "octo@example.com").await;
        add_test_member(&pool, &org, &user, Role::Member).await;
        let team = create_test_team(&pool, &org, "backend").await;
        link_external_user(&pool, &org, "@octocat", &user).await;
        link_external_team(&pool, &org, "@acme/backend", &team).await;

        let context = ValidationContext {
            ownership: ProjectOwnership::default_for(project.id),
            project: project.clone(),
        };
        let mut conn = pool.acquire().await.unwrap();
        let validated = ProjectCodeOwnerSerializer::new(&context, &record)
            .validate(
                &mut conn,
                &payload(json!({"raw": "/src/api/ @acme/backend\n*.md @octocat octo@example.com\n"})),
            )
            .await
            .unwrap();

        assert_eq!(validated.code_mapping.id, mapping.id);
        assert_eq!(
            validated.schema,
            json!({
                "$version": 1,
                "rules": [
                    {
                        "matcher": {"type": "codeowners", "pattern": "/app/api/"},
                        "owners": [{"type": "team", "identifier": "backend"}]
                    },
                    {
                        "matcher": {"type": "codeowners", "pattern": "*.md"},
                        "owners": [{"type": "user", "identifier": "octo@example.com"}]
                    }
                ]
            })
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_validate_reports_every_unresolved_owner(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let mapping = create_test_code_mapping(&pool, &project, "", "").await;
        let record = create_test_code_owners(&pool, &project, &mapping, "").await;

        let context = ValidationContext {
            ownership: ProjectOwnership::default_for(project.id),
            project: project.clone(),
        };
        let mut conn = pool.acquire().await.unwrap();
        let err = ProjectCodeOwnerSerializer::new(&context, &record)
            .validate(&mut conn, &payload(json!({"raw": "* @ghost @acme/nobody stranger@example.com"})))
            .await
            .unwrap_err();

        let Error::Validation { errors } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(
            errors["raw"],
            vec![
                "The following emails do not have a Lookout user: stranger@example.com",
                "The following usernames do not have an association in Lookout: @ghost",
                "The following team names do not have an association in Lookout: @acme/nobody",
            ]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_validate_rejects_foreign_and_used_code_mappings(pool: PgPool) {
        let org = create_test_organization(&pool, "acme").await;
        let project = create_test_project(&pool, &org, "web", None).await;
        let other = create_test_project(&pool, &org, "api", None).await;
        let mapping = create_test_code_mapping(&pool, &project, "", "").await;
        let taken = create_test_code_mapping(&pool, &project, "lib/", "").await;
        let foreign = create_test_code_mapping(&pool, &other, "", "").await;
        let record = create_test_code_owners(&pool, &project, &mapping, "").await;
        create_test_code_owners(&pool, &project, &taken, "").await;

        let context = ValidationContext {
            ownership: ProjectOwnership::default_for(project.id),
            project: project.clone(),
        };
        let serializer = ProjectCodeOwnerSerializer::new(&context, &record);
        let mut conn = pool.acquire().await.unwrap();

        let err = serializer
            .validate(&mut conn, &payload(json!({"codeMappingId": foreign.id.to_string()})))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Validation { errors } if errors["codeMappingId"] == vec!["This code mapping does not exist."]));

        let err = serializer
            .validate(&mut conn, &payload(json!({"codeMappingId": taken.id})))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Validation { errors } if errors["codeMappingId"] == vec!["This code mapping is already in use."]));

        // Re-submitting its own mapping is fine
        let validated = serializer
            .validate(&mut conn, &payload(json!({"codeMappingId": mapping.id})))
            .await
            .unwrap();
        assert_eq!(validated.code_mapping.id, mapping.id);
        assert_eq!(validated.schema, json!({"$version": 1, "rules": []}));
    }
}
