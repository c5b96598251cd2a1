//! Database record models matching table schemas.
//!
//! Models derive `sqlx::FromRow` for query results and are kept separate from the API models
//! in [`crate::api::models`] so storage and wire formats can evolve independently.
//!
//! - [`users`]: user accounts
//! - [`organizations`]: organizations, memberships and teams
//! - [`projects`]: projects, issue owner settings and code mappings
//! - [`code_owners`]: CODEOWNERS records and external actor associations
//! - [`events`]: issue groups, events and the group inbox

pub mod code_owners;
pub mod events;
pub mod organizations;
pub mod projects;
pub mod users;
