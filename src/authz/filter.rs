use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::Method;
use percent_encoding::percent_decode_str;

use super::authorizer::{Authorizer, OrAuthorizer};
use super::builder::{PolicyBuilder, Target};
use super::decision::{AccessLevel, Decision};
use crate::errors::{AppError, AppResult, AuthzError};
use crate::models::{ObjectType, PathTable};

const RECURSIVE_WILDCARD: &str = "/**";

/// Literal request path, optionally ending in `/**` to also cover everything
/// beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    prefix: String,
    recursive: bool,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> AppResult<Self> {
        if !pattern.starts_with('/') {
            return Err(AppError::configuration(format!(
                "path pattern '{pattern}' must start with '/'"
            )));
        }

        let (prefix, recursive) = match pattern.strip_suffix(RECURSIVE_WILDCARD) {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };
        if prefix.contains('*') {
            return Err(AppError::configuration(format!(
                "path pattern '{pattern}' may only end with a recursive wildcard"
            )));
        }

        Ok(Self {
            prefix: trim_trailing_slash(prefix).to_string(),
            recursive,
        })
    }

    /// `base` and everything beneath it.
    pub fn recursive(base: &str) -> Self {
        Self {
            prefix: trim_trailing_slash(base).to_string(),
            recursive: true,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        if path == self.prefix {
            return true;
        }
        self.recursive
            && path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Canonical form of a request path as the route extractors see it.
///
/// Percent escapes are decoded, empty and `.` segments dropped and `..`
/// resolved against the preceding segment. The result always starts with `/`
/// and never ends with one, except for the root itself.
pub fn normalize_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recursive {
            write!(f, "{}{RECURSIVE_WILDCARD}", self.prefix)
        } else {
            f.write_str(&self.prefix)
        }
    }
}

/// Conditions under which the dispatcher runs a filter
#[derive(Debug, Clone)]
pub struct FilterMatcher<'a> {
    pub methods: &'a [Method],
    pub path: &'a PathPattern,
}

impl FilterMatcher<'_> {
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.methods.contains(method) && self.path.matches(path)
    }
}

/// Unit the request dispatcher matches and invokes
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;
    fn matchers(&self) -> FilterMatcher<'_>;
    fn authorize(&self, request: &mut Parts) -> Decision;
}

/// Compiled policy for one (methods, path) pair
#[derive(Debug)]
pub struct AuthorizationFilter {
    name: String,
    methods: Vec<Method>,
    path: PathPattern,
    authorizer: OrAuthorizer,
}

impl AuthorizationFilter {
    pub fn new(methods: Vec<Method>, path: PathPattern, authorizer: OrAuthorizer) -> Self {
        let name = format!(
            "{}-AuthzFilter@{}",
            methods.iter().map(Method::as_str).collect::<Vec<_>>().join("/"),
            path
        );
        Self {
            name,
            methods,
            path,
            authorizer,
        }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    pub fn authorizer(&self) -> &OrAuthorizer {
        &self.authorizer
    }
}

impl Filter for AuthorizationFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn matchers(&self) -> FilterMatcher<'_> {
        FilterMatcher {
            methods: &self.methods,
            path: &self.path,
        }
    }

    fn authorize(&self, request: &mut Parts) -> Decision {
        self.authorizer.authorize(request)
    }
}

/// Result of running every matching filter against one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// No filter covers the method and path
    Unmatched,
    /// Every matching filter abstained
    Abstained,
    /// At least one filter allowed and none denied; carries the last grant
    Allowed(AccessLevel),
    Denied { filter: String, error: AuthzError },
}

/// Ordered set of authorization filters plus the path table used to resolve
/// resource types while registering them.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    paths: PathTable,
    filters: Vec<Arc<AuthorizationFilter>>,
}

impl FilterRegistry {
    pub fn new(paths: PathTable) -> Self {
        Self {
            paths,
            filters: Vec::new(),
        }
    }

    /// Starts a policy session for every path of a resource type.
    pub fn authorize_type(&mut self, object_type: ObjectType) -> PolicyBuilder<'_> {
        PolicyBuilder::new(self, Target::Type(object_type))
    }

    /// Starts a policy session for an explicit path pattern.
    pub fn authorize_path(&mut self, path: impl Into<String>) -> PolicyBuilder<'_> {
        PolicyBuilder::new(self, Target::Path(path.into()))
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn filters(&self) -> &[Arc<AuthorizationFilter>] {
        &self.filters
    }

    pub(crate) fn attach(&mut self, filter: AuthorizationFilter) {
        tracing::info!(filter = %filter.name, "registered authorization filter");
        self.filters.push(Arc::new(filter));
    }

    pub fn matching<'a>(&'a self, method: &'a Method, path: &'a str) -> impl Iterator<Item = &'a Arc<AuthorizationFilter>> + 'a {
        self.filters
            .iter()
            .filter(move |filter| filter.matchers().matches(method, path))
    }

    /// Runs the matching filters in registration order, stopping at the first
    /// denial. Filters are matched against the normalized request path.
    pub fn authorize(&self, request: &mut Parts) -> ChainOutcome {
        let method = request.method.clone();
        let path = normalize_path(request.uri.path());

        let mut outcome = ChainOutcome::Unmatched;
        for filter in self.matching(&method, &path) {
            let decision = filter.authorize(request);
            tracing::trace!(filter = %filter.name(), decision = decision.kind(), "filter evaluated");
            match decision {
                Decision::Allow(level) => outcome = ChainOutcome::Allowed(level),
                Decision::Deny(error) => {
                    tracing::debug!(filter = %filter.name(), error = %error, "authorization denied");
                    return ChainOutcome::Denied {
                        filter: filter.name().to_string(),
                        error,
                    };
                }
                Decision::Abstain => {
                    tracing::debug!(filter = %filter.name(), "authorization abstained");
                    if outcome == ChainOutcome::Unmatched {
                        outcome = ChainOutcome::Abstained;
                    }
                }
            }
        }
        outcome
    }
}
