//! API request/response models for project CODEOWNERS.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::models::code_owners::CodeOwnersDBResponse;
use crate::errors::{Error, NON_FIELD_ERRORS, Result};

/// Path parameters for `/projects/{organization_slug}/{project_slug}/codeowners/{codeowners_id}/`.
///
/// `codeowners_id` stays a string so that non-numeric ids are a plain 404.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeOwnersPathParams {
    pub organization_slug: String,
    pub project_slug: String,
    pub codeowners_id: String,
}

/// Partial update of a CODEOWNERS record. Absent fields keep their stored value.
///
/// Fields are taken as raw JSON so type errors come back as per-field validation errors, and an
/// explicit `null` stays distinguishable from an absent key.
#[derive(Debug, Clone, Default, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CodeOwnersUpdate {
    /// CODEOWNERS file contents
    #[schema(value_type = Option<String>)]
    pub raw: Option<Value>,
    /// Code mapping id, as a string or an integer
    #[schema(value_type = Option<String>)]
    pub code_mapping_id: Option<Value>,
}

impl CodeOwnersUpdate {
    /// Take the known keys out of a request body, which must be a JSON object
    pub fn from_json(body: Value) -> Result<Self> {
        match body {
            Value::Object(mut fields) => Ok(Self {
                raw: fields.remove("raw"),
                code_mapping_id: fields.remove("codeMappingId"),
            }),
            other => Err(Error::field(
                NON_FIELD_ERRORS,
                format!("Invalid data. Expected a dictionary, but got {}.", json_type_name(&other)),
            )),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeOwnersResponse {
    pub id: String,
    pub raw: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub code_mapping_id: String,
    /// Source control provider of the linked repository, `unknown` if not set
    pub provider: String,
    #[schema(value_type = Object)]
    pub schema: Value,
}

impl CodeOwnersResponse {
    pub fn new(record: CodeOwnersDBResponse, provider: Option<String>) -> Self {
        Self {
            id: record.id.to_string(),
            raw: record.raw,
            date_created: record.date_added,
            date_updated: record.date_updated,
            code_mapping_id: record.code_mapping_id.to_string(),
            provider: provider.unwrap_or_else(|| "unknown".to_string()),
            schema: record.schema,
        }
    }
}
