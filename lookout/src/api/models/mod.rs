//! API request and response data models.

pub mod code_owners;
pub mod events;
pub mod projects;
pub mod users;
