//! Authorization module - policy algebra and filters
//!
//! Requests are reduced to a three-valued [`Decision`] by composable
//! authorizers:
//! - claim predicates (trusted clone, client id, scopes) wrapped by
//!   [`BaseAuthorizer`]
//! - [`AndAuthorizer`] / [`OrAuthorizer`] combinators
//! - a fluent [`PolicyBuilder`] that compiles per-method rules into
//!   [`AuthorizationFilter`]s held by a [`FilterRegistry`]

mod authorizer;
mod base;
mod builder;
mod decision;
mod filter;
mod predicates;
mod principal;

pub use authorizer::{AndAuthorizer, Authorizer, OrAuthorizer};
pub use base::{BaseAuthorizer, ClaimPredicate};
pub use builder::{PolicyBuilder, TenantConfig};
pub use decision::{AccessLevel, Decision};
pub use filter::{normalize_path, AuthorizationFilter, ChainOutcome, Filter, FilterMatcher, FilterRegistry, PathPattern};
pub use predicates::{
    oauth_client_authorizer, oauth_clone_authorizer, optional_scopes_authorizer, prefix_scopes,
    required_scopes_authorizer, ClientIdPredicate, ScopesPredicate, TrustedClonePredicate,
};
pub use principal::{user_from_parts, with_user, AuthenticationType, UserContext};

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzMode {
    /// No permission checks (development mode)
    Off,
    /// Log denials but allow requests (testing mode)
    Advisory,
    /// Enforce 403 on denied requests (production mode)
    #[default]
    Strict,
}

impl AuthzMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "off" => Some(AuthzMode::Off),
            "advisory" => Some(AuthzMode::Advisory),
            "strict" => Some(AuthzMode::Strict),
            _ => None,
        }
    }
}

/// Well-known scope names, relative to the tenant clone space
pub mod scopes {
    pub const ADMIN_READ: &str = "admin.read";
    pub const ADMIN_WRITE: &str = "admin.write";

    pub const CATALOG_READ: &str = "catalog.read";
    pub const CATALOG_READ_ALL: &str = "catalog.read.all";

    pub const INSTANCE_READ: &str = "instance.read";
    pub const INSTANCE_READ_ALL: &str = "instance.read.all";
    pub const INSTANCE_WRITE: &str = "instance.write";
}
