//! HTTP API: request handlers and their wire models.

pub mod handlers;
pub mod models;
