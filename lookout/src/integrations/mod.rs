//! Clients for third-party platforms.

pub mod vercel;
