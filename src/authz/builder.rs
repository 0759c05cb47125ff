use std::sync::Arc;

use axum::http::Method;

use super::authorizer::{AndAuthorizer, Authorizer, OrAuthorizer};
use super::decision::AccessLevel;
use super::filter::{AuthorizationFilter, FilterRegistry, PathPattern};
use super::predicates::{oauth_client_authorizer, oauth_clone_authorizer, prefix_scopes, required_scopes_authorizer};
use crate::errors::{AppError, AppResult};
use crate::models::ObjectType;

/// Tenant parameters shared by the `global`, `tenant` and `all_tenant` rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantConfig {
    /// Namespace prepended to every configured scope
    pub clone_space: String,
    /// OAuth client trusted for tenant-scoped access
    pub client_id: String,
    /// Suffix identifying clones of the service's OAuth client
    pub trusted_client_id_suffix: String,
}

impl TenantConfig {
    pub fn new(
        clone_space: impl Into<String>,
        client_id: impl Into<String>,
        trusted_client_id_suffix: impl Into<String>,
    ) -> Self {
        Self {
            clone_space: clone_space.into(),
            client_id: client_id.into(),
            trusted_client_id_suffix: trusted_client_id_suffix.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Target {
    Type(ObjectType),
    Path(String),
}

#[derive(Debug, Default)]
struct RuleNode {
    methods: Vec<Method>,
    authorizers: Vec<Arc<dyn Authorizer>>,
}

/// Fluent session declaring the policies of one resource type or path.
///
/// Each `and()` starts another group of methods and authorizers for the same
/// target. Nothing reaches the registry until `register()`, which publishes
/// every group or none of them.
///
/// ```ignore
/// registry
///     .authorize_type(ObjectType::ServiceInstance)
///     .configure("sm", "sm-client", "-clone")
///     .for_methods([Method::GET])
///     .tenant(["instance.read"])
///     .and()
///     .for_methods([Method::DELETE])
///     .global(["instance.delete"])
///     .register()?;
/// ```
#[must_use = "policies are only published by `register()`"]
pub struct PolicyBuilder<'r> {
    registry: &'r mut FilterRegistry,
    target: Target,
    tenant: Option<TenantConfig>,
    closed: Vec<RuleNode>,
    current: RuleNode,
    error: Option<AppError>,
}

impl<'r> PolicyBuilder<'r> {
    pub(crate) fn new(registry: &'r mut FilterRegistry, target: Target) -> Self {
        Self {
            registry,
            target,
            tenant: None,
            closed: Vec::new(),
            current: RuleNode::default(),
            error: None,
        }
    }

    pub fn configure(
        self,
        clone_space: impl Into<String>,
        client_id: impl Into<String>,
        trusted_client_id_suffix: impl Into<String>,
    ) -> Self {
        self.with_tenant(TenantConfig::new(clone_space, client_id, trusted_client_id_suffix))
    }

    pub fn with_tenant(mut self, tenant: TenantConfig) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn custom(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.current.authorizers.push(Arc::new(authorizer));
        self
    }

    /// Trusted clone holding one of `scopes`, granted global access.
    pub fn global<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(tenant) = self.tenant_for("global") else {
            return self;
        };
        let rules: Vec<Arc<dyn Authorizer>> = vec![
            Arc::new(oauth_clone_authorizer(tenant.trusted_client_id_suffix, AccessLevel::GlobalAccess)),
            Arc::new(required_scopes_authorizer(
                prefix_scopes(&tenant.clone_space, scopes),
                AccessLevel::GlobalAccess,
            )),
        ];
        self.custom(AndAuthorizer::new(rules))
    }

    /// Trusted client or clone holding one of `scopes`, granted tenant access.
    pub fn tenant<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(tenant) = self.tenant_for("tenant") else {
            return self;
        };
        let trusted: Vec<Arc<dyn Authorizer>> = vec![
            Arc::new(oauth_client_authorizer(tenant.client_id, AccessLevel::GlobalAccess)),
            Arc::new(oauth_clone_authorizer(tenant.trusted_client_id_suffix, AccessLevel::GlobalAccess)),
        ];
        let rules: Vec<Arc<dyn Authorizer>> = vec![
            Arc::new(OrAuthorizer::new(trusted)),
            Arc::new(required_scopes_authorizer(
                prefix_scopes(&tenant.clone_space, scopes),
                AccessLevel::TenantAccess,
            )),
        ];
        self.custom(AndAuthorizer::new(rules))
    }

    /// Trusted clone holding one of `scopes`, granted access across tenants.
    pub fn all_tenant<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(tenant) = self.tenant_for("all_tenant") else {
            return self;
        };
        let rules: Vec<Arc<dyn Authorizer>> = vec![
            Arc::new(oauth_clone_authorizer(tenant.trusted_client_id_suffix, AccessLevel::GlobalAccess)),
            Arc::new(required_scopes_authorizer(
                prefix_scopes(&tenant.clone_space, scopes),
                AccessLevel::AllTenantAccess,
            )),
        ];
        self.custom(AndAuthorizer::new(rules))
    }

    pub fn for_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.current.methods = methods.into_iter().collect();
        self
    }

    /// Closes the current group and opens the next one for the same target.
    pub fn and(mut self) -> Self {
        let closed = std::mem::take(&mut self.current);
        self.closed.push(closed);
        self
    }

    /// Compiles every group into a filter and publishes them to the registry,
    /// most recently declared group first.
    pub fn register(self) -> AppResult<&'r mut FilterRegistry> {
        let Self {
            registry,
            target,
            closed,
            current,
            error,
            ..
        } = self;

        if let Some(err) = error {
            return Err(err);
        }

        let path = match &target {
            Target::Path(path) => PathPattern::parse(path)?,
            Target::Type(object_type) => registry.paths().get(*object_type).cloned().ok_or_else(|| {
                AppError::configuration(format!("no path registered for resource type {object_type}"))
            })?,
        };

        let mut filters = Vec::with_capacity(closed.len() + 1);
        for node in std::iter::once(current).chain(closed.into_iter().rev()) {
            if node.methods.is_empty() {
                return Err(AppError::configuration(format!(
                    "cannot register authorization for {path} with no methods"
                )));
            }
            filters.push(AuthorizationFilter::new(
                node.methods,
                path.clone(),
                OrAuthorizer::new(node.authorizers),
            ));
        }

        for filter in filters {
            registry.attach(filter);
        }
        Ok(registry)
    }

    fn tenant_for(&mut self, rule: &str) -> Option<TenantConfig> {
        if self.tenant.is_none() && self.error.is_none() {
            self.error = Some(AppError::configuration(format!(
                "`{rule}` authorization for {} used before `configure`",
                self.target
            )));
        }
        self.tenant.clone()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Type(object_type) => write!(f, "resource type {object_type}"),
            Target::Path(path) => write!(f, "path {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::filter::Filter;
    use crate::models::PathTable;

    fn registry() -> FilterRegistry {
        FilterRegistry::new(PathTable::service_manager())
    }

    #[test]
    fn test_groups_register_most_recent_first() {
        let mut registry = registry();
        registry
            .authorize_type(ObjectType::Platform)
            .configure("sm", "sm-client", "-clone")
            .for_methods([Method::GET])
            .global(["platform.read"])
            .and()
            .for_methods([Method::POST, Method::PATCH])
            .global(["platform.write"])
            .register()
            .unwrap();

        let names: Vec<_> = registry.filters().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "POST/PATCH-AuthzFilter@/v1/platforms/**".to_string(),
                "GET-AuthzFilter@/v1/platforms/**".to_string(),
            ]
        );
    }

    #[test]
    fn test_group_without_methods_is_rejected_atomically() {
        let mut registry = registry();
        let result = registry
            .authorize_path("/v1/info")
            .configure("sm", "sm-client", "-clone")
            .for_methods([Method::GET])
            .global(["info.read"])
            .and()
            .global(["info.write"])
            .register();

        let err = result.err().unwrap();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("/v1/info"), "{err}");
        assert!(registry.filters().is_empty());
    }

    #[test]
    fn test_unresolvable_type_is_configuration_error() {
        let mut registry = FilterRegistry::new(PathTable::default());
        let result = registry
            .authorize_type(ObjectType::ServicePlan)
            .for_methods([Method::GET])
            .register();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_rules_before_configure_are_rejected() {
        let mut registry = registry();
        let result = registry
            .authorize_type(ObjectType::ServicePlan)
            .for_methods([Method::GET])
            .tenant(["plan.read"])
            .register();

        let err = result.err().unwrap();
        assert!(err.to_string().contains("before `configure`"), "{err}");
    }

    #[test]
    fn test_tenant_rule_shape() {
        let mut registry = registry();
        registry
            .authorize_path("/v1/service_instances/**")
            .configure("a", "known-client", "-xyz")
            .for_methods([Method::GET])
            .tenant(["instance.read"])
            .register()
            .unwrap();

        let filter = &registry.filters()[0];
        let rules = filter.authorizer().children();
        assert_eq!(rules.len(), 1);
        let rendered = format!("{:?}", rules[0]);
        assert!(rendered.contains("ClientIdPredicate"), "{rendered}");
        assert!(rendered.contains("TrustedClonePredicate"), "{rendered}");
        assert!(rendered.contains("a.instance.read"), "{rendered}");
    }
}
