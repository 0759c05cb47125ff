use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;

use super::decision::{AccessLevel, Decision};
use crate::errors::AuthzError;

/// Reduces a request to a [`Decision`].
///
/// Implementations are immutable once built and may be invoked concurrently.
/// The only state they touch is the request's own extensions.
pub trait Authorizer: fmt::Debug + Send + Sync {
    fn authorize(&self, request: &mut Parts) -> Decision;
}

impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    fn authorize(&self, request: &mut Parts) -> Decision {
        (**self).authorize(request)
    }
}

impl<A: Authorizer + ?Sized> Authorizer for Box<A> {
    fn authorize(&self, request: &mut Parts) -> Decision {
        (**self).authorize(request)
    }
}

/// Conjunction of required checks.
///
/// Children run in order. The first `Deny` or `Abstain` is returned as is and
/// the remaining children are skipped. When every child allows, the level of
/// the last child wins. An empty conjunction allows with `NoAccess`.
#[derive(Debug, Clone, Default)]
pub struct AndAuthorizer {
    children: Vec<Arc<dyn Authorizer>>,
}

impl AndAuthorizer {
    pub fn new(children: Vec<Arc<dyn Authorizer>>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Arc<dyn Authorizer>] {
        &self.children
    }
}

impl Authorizer for AndAuthorizer {
    fn authorize(&self, request: &mut Parts) -> Decision {
        let mut level = AccessLevel::NoAccess;
        for child in &self.children {
            match child.authorize(request) {
                Decision::Allow(granted) => level = granted,
                other => return other,
            }
        }
        Decision::Allow(level)
    }
}

/// Disjunction of alternative policies.
///
/// Children run in order and the first `Allow` wins. Without an `Allow`, any
/// denials are folded into one `Deny`; if every child abstained (or there are
/// none) the result is `Abstain`.
#[derive(Debug, Clone, Default)]
pub struct OrAuthorizer {
    children: Vec<Arc<dyn Authorizer>>,
}

impl OrAuthorizer {
    pub fn new(children: Vec<Arc<dyn Authorizer>>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Arc<dyn Authorizer>] {
        &self.children
    }
}

impl Authorizer for OrAuthorizer {
    fn authorize(&self, request: &mut Parts) -> Decision {
        let mut denials: Vec<AuthzError> = Vec::new();
        for child in &self.children {
            match child.authorize(request) {
                allow @ Decision::Allow(_) => return allow,
                Decision::Deny(err) => denials.push(err),
                Decision::Abstain => {}
            }
        }

        if denials.is_empty() {
            Decision::Abstain
        } else {
            Decision::Deny(AuthzError::combine(denials))
        }
    }
}
