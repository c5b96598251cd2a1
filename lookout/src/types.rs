//! Common type definitions and permission system types.
//!
//! # ID Types
//!
//! Entity IDs are Postgres `BIGSERIAL` values wrapped in type aliases, except for events,
//! which carry the client-facing UUID:
//!
//! - [`OrganizationId`], [`ProjectId`], [`TeamId`], [`UserId`]
//! - [`CodeOwnersId`], [`CodeMappingId`]
//! - [`GroupId`]: issue group identifier
//! - [`EventId`]: event UUID (rendered without dashes on the wire)
//!
//! # Permission System
//!
//! Permissions are scopes of the form `<resource>:<operation>`, e.g. `project:write`. Roles
//! map to scope sets in [`crate::auth::permissions`].

use std::fmt;
use uuid::Uuid;

pub type OrganizationId = i64;
pub type ProjectId = i64;
pub type TeamId = i64;
pub type UserId = i64;
pub type CodeOwnersId = i64;
pub type CodeMappingId = i64;
pub type GroupId = i64;
pub type EventId = Uuid;

/// Render an event UUID the way clients expect it: 32 lowercase hex characters.
pub fn event_id_hex(id: &EventId) -> String {
    id.simple().to_string()
}

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Admin,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Organizations,
    Projects,
    Events,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Logical combinator
    Any(Vec<Permission>),
}

impl Resource {
    /// Scope prefix used in permission strings
    pub fn scope_prefix(&self) -> &'static str {
        match self {
            Resource::Organizations => "org",
            Resource::Projects => "project",
            Resource::Events => "event",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
            Operation::Admin => write!(f, "admin"),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Allow(resource, operation) => write!(f, "{}:{}", resource.scope_prefix(), operation),
            Permission::Any(permissions) => {
                let scopes: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
                write!(f, "any of [{}]", scopes.join(", "))
            }
        }
    }
}
