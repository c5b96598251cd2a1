//! Authentication and authorization.
//!
//! Lookout sits behind an authenticating proxy (oauth2-proxy, vouch, ...). The proxy puts the
//! user's email in a trusted header (`auth.proxy_header.header_name`, `x-lookout-user` by
//! default) and [`current_user`] resolves it to a stored user. Unknown users are rejected.
//!
//! Authorization is organization scoped: handlers look up the caller's membership and check
//! it against a scope with [`permissions::require_permission`].

pub mod current_user;
pub mod permissions;
