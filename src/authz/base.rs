use axum::http::request::Parts;

use super::authorizer::Authorizer;
use super::decision::Decision;
use super::principal::{user_from_parts, with_user, AuthenticationType, UserContext};

/// Claim check run against a bearer identity
pub trait ClaimPredicate: std::fmt::Debug + Send + Sync {
    fn evaluate(&self, user: &UserContext) -> Decision;
}

/// Adapts a [`ClaimPredicate`] to the [`Authorizer`] contract.
///
/// Requests without an identity, or authenticated by anything other than a
/// bearer token, are not this authorizer's business and yield `Abstain`.
#[derive(Debug, Clone)]
pub struct BaseAuthorizer<P> {
    predicate: P,
}

impl<P: ClaimPredicate> BaseAuthorizer<P> {
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }
}

impl<P: ClaimPredicate> Authorizer for BaseAuthorizer<P> {
    fn authorize(&self, request: &mut Parts) -> Decision {
        let Some(user) = user_from_parts(request) else {
            return Decision::Abstain;
        };

        if user.authentication_type != AuthenticationType::Bearer {
            return Decision::Abstain;
        }

        let decision = self.predicate.evaluate(user);
        if decision.is_deny() {
            return decision;
        }

        let user = user.clone();
        with_user(request, user);
        decision
    }
}
