//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (typically a transaction), binds its
//! parameters at runtime and returns the models from [`crate::db::models`]:
//!
//! ```ignore
//! use lookout::db::handlers::CodeOwners;
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = CodeOwners::new(&mut tx);
//! let record = repo.get_for_project(id, project.id).await?;
//! tx.commit().await?;
//! ```
//!
//! - [`CodeOwners`]: CODEOWNERS records
//! - [`Projects`], [`ProjectOwnerships`], [`CodeMappings`]: project configuration
//! - [`Organizations`], [`Users`], [`ExternalActors`]: identities and memberships
//! - [`Groups`], [`Events`], [`GroupInbox`]: issue data

pub mod code_owners;
pub mod events;
pub mod external_actors;
pub mod organizations;
pub mod projects;
pub mod users;

pub use code_owners::CodeOwners;
pub use events::{Events, GroupInbox, Groups};
pub use external_actors::ExternalActors;
pub use organizations::Organizations;
pub use projects::{CodeMappings, ProjectOwnerships, Projects};
pub use users::Users;
