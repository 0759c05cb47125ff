//! OAuth claim predicates and the authorizers built from them.

use serde::Deserialize;

use super::base::{BaseAuthorizer, ClaimPredicate};
use super::decision::{AccessLevel, Decision};
use super::principal::UserContext;
use crate::errors::AuthzError;

#[derive(Debug, Deserialize)]
struct ClientClaims {
    #[serde(default)]
    zid: String,
    #[serde(default)]
    cid: String,
}

#[derive(Debug, Deserialize)]
struct ScopeClaims {
    #[serde(default, rename = "scope")]
    scopes: Vec<String>,
}

/// Allows tokens issued to a clone of the service's OAuth client, recognised
/// by the client id suffix.
#[derive(Debug, Clone)]
pub struct TrustedClonePredicate {
    trusted_suffix: String,
    level: AccessLevel,
}

impl TrustedClonePredicate {
    pub fn new(trusted_suffix: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            trusted_suffix: trusted_suffix.into(),
            level,
        }
    }

    fn is_trusted(&self, cid: &str) -> bool {
        // an empty suffix would trust every client
        !self.trusted_suffix.is_empty() && cid.ends_with(&self.trusted_suffix)
    }
}

impl ClaimPredicate for TrustedClonePredicate {
    fn evaluate(&self, user: &UserContext) -> Decision {
        let claims: ClientClaims = match user.claims() {
            Ok(claims) => claims,
            Err(err) => return Decision::Deny(AuthzError::invalid_token(err)),
        };
        tracing::debug!(zid = %claims.zid, cid = %claims.cid, "user token");

        if !self.is_trusted(&claims.cid) {
            tracing::debug!(
                cid = %claims.cid,
                suffix = %self.trusted_suffix,
                "client id is not generated from a clone OAuth client"
            );
            return Decision::Deny(AuthzError::UntrustedClone { cid: claims.cid });
        }

        Decision::Allow(self.level)
    }
}

/// Allows tokens issued to exactly one OAuth client
#[derive(Debug, Clone)]
pub struct ClientIdPredicate {
    client_id: String,
    level: AccessLevel,
}

impl ClientIdPredicate {
    pub fn new(client_id: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            client_id: client_id.into(),
            level,
        }
    }
}

impl ClaimPredicate for ClientIdPredicate {
    fn evaluate(&self, user: &UserContext) -> Decision {
        let claims: ClientClaims = match user.claims() {
            Ok(claims) => claims,
            Err(err) => return Decision::Deny(AuthzError::invalid_token(err)),
        };
        tracing::debug!(cid = %claims.cid, "user token");

        if claims.cid != self.client_id {
            tracing::debug!(
                cid = %claims.cid,
                expected = %self.client_id,
                "client id does not match the required client id"
            );
            return Decision::Deny(AuthzError::UntrustedClient { cid: claims.cid });
        }

        Decision::Allow(self.level)
    }
}

/// Allows tokens carrying at least one of the configured scopes.
///
/// When none match, a mandatory predicate denies and an optional one abstains.
#[derive(Debug, Clone)]
pub struct ScopesPredicate {
    scopes: Vec<String>,
    mandatory: bool,
    level: AccessLevel,
}

impl ScopesPredicate {
    pub fn mandatory(scopes: Vec<String>, level: AccessLevel) -> Self {
        Self {
            scopes,
            mandatory: true,
            level,
        }
    }

    pub fn optional(scopes: Vec<String>, level: AccessLevel) -> Self {
        Self {
            scopes,
            mandatory: false,
            level,
        }
    }
}

impl ClaimPredicate for ScopesPredicate {
    fn evaluate(&self, user: &UserContext) -> Decision {
        let claims: ScopeClaims = match user.claims() {
            Ok(claims) => claims,
            Err(err) => return Decision::Deny(AuthzError::invalid_token(err)),
        };
        tracing::debug!(scopes = ?claims.scopes, "user token scopes");

        if self.scopes.iter().any(|scope| claims.scopes.contains(scope)) {
            return Decision::Allow(self.level);
        }

        if self.mandatory {
            return Decision::Deny(AuthzError::MissingScopes {
                required: self.scopes.clone(),
                presented: claims.scopes,
            });
        }

        tracing::debug!(
            optional = ?self.scopes,
            scopes = ?claims.scopes,
            "none of the optional scopes are present in the user token"
        );
        Decision::Abstain
    }
}

pub fn oauth_clone_authorizer(trusted_suffix: impl Into<String>, level: AccessLevel) -> BaseAuthorizer<TrustedClonePredicate> {
    BaseAuthorizer::new(TrustedClonePredicate::new(trusted_suffix, level))
}

pub fn oauth_client_authorizer(client_id: impl Into<String>, level: AccessLevel) -> BaseAuthorizer<ClientIdPredicate> {
    BaseAuthorizer::new(ClientIdPredicate::new(client_id, level))
}

pub fn required_scopes_authorizer(scopes: Vec<String>, level: AccessLevel) -> BaseAuthorizer<ScopesPredicate> {
    BaseAuthorizer::new(ScopesPredicate::mandatory(scopes, level))
}

pub fn optional_scopes_authorizer(scopes: Vec<String>, level: AccessLevel) -> BaseAuthorizer<ScopesPredicate> {
    BaseAuthorizer::new(ScopesPredicate::optional(scopes, level))
}

/// Namespaces each scope under a tenant space: `read` in space `a` becomes `a.read`.
pub fn prefix_scopes<I>(space: &str, scopes: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    scopes
        .into_iter()
        .map(|scope| format!("{}.{}", space, scope.as_ref()))
        .collect()
}
