//! Role based permission checks.
//!
//! Organization roles grant scopes; a request is allowed if the caller's membership role
//! grants the scope the handler asks for.
//!
//! | scope           | member | admin | manager | owner |
//! |-----------------|--------|-------|---------|-------|
//! | `org:read`      | ✓      | ✓     | ✓       | ✓     |
//! | `project:read`  | ✓      | ✓     | ✓       | ✓     |
//! | `project:write` |        | ✓     | ✓       | ✓     |
//! | `project:admin` |        | ✓     | ✓       | ✓     |
//! | `event:read`    | ✓      | ✓     | ✓       | ✓     |
//! | `event:write`   | ✓      | ✓     | ✓       | ✓     |
//! | `event:admin`   | ✓      | ✓     | ✓       | ✓     |
//! | `org:write`     |        |       | ✓       | ✓     |
//! | `org:admin`     |        |       |         | ✓     |

use crate::api::models::users::Role;
use crate::db::models::organizations::OrganizationMemberDBResponse;
use crate::errors::{Error, Result};
use crate::types::{Operation, Permission, Resource};

/// Whether a role grants `operation` on `resource`
pub fn role_has_permission(role: Role, resource: Resource, operation: Operation) -> bool {
    match resource {
        Resource::Events => true,
        Resource::Projects => match operation {
            Operation::Read => true,
            Operation::Write | Operation::Admin => role >= Role::Admin,
        },
        Resource::Organizations => match operation {
            Operation::Read => true,
            Operation::Write => role >= Role::Manager,
            Operation::Admin => role == Role::Owner,
        },
    }
}

pub fn has_permission(member: &OrganizationMemberDBResponse, permission: &Permission) -> bool {
    match permission {
        Permission::Allow(resource, operation) => role_has_permission(member.role, *resource, *operation),
        Permission::Any(permissions) => permissions.iter().any(|p| has_permission(member, p)),
    }
}

/// Fail with [`Error::InsufficientPermissions`] unless the member holds `permission`
pub fn require_permission(member: &OrganizationMemberDBResponse, permission: Permission, resource: String) -> Result<()> {
    if has_permission(member, &permission) {
        return Ok(());
    }

    let action = match &permission {
        Permission::Allow(_, operation) => *operation,
        Permission::Any(_) => Operation::Read,
    };
    Err(Error::InsufficientPermissions {
        required: permission,
        action,
        resource,
    })
}
