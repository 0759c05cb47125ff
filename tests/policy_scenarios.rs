use anyhow::Result;
use axum::http::request::Parts;
use axum::http::{Method, Request};
use serde_json::{json, Value};

use sm_authz::authz::{
    required_scopes_authorizer, prefix_scopes, with_user, AccessLevel, AuthenticationType, Decision, Filter,
    FilterRegistry, UserContext,
};
use sm_authz::errors::AuthzError;
use sm_authz::models::{ObjectType, PathTable};

fn request(method: Method, uri: &str, user: Option<UserContext>) -> Result<Parts> {
    let (mut parts, _) = Request::builder().method(method).uri(uri).body(())?.into_parts();
    if let Some(user) = user {
        with_user(&mut parts, user);
    }
    Ok(parts)
}

fn bearer(claims: Value) -> Option<UserContext> {
    Some(UserContext::bearer(claims))
}

#[test]
fn global_policy_denies_trusted_clone_without_scope() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    registry
        .authorize_type(ObjectType::ServiceBroker)
        .configure("sm", "known-client", "-xyz")
        .for_methods([Method::GET])
        .global(["broker.read"])
        .register()?;

    let filter = &registry.filters()[0];
    let mut parts = request(Method::GET, "/v1/service_brokers", bearer(json!({"cid": "sm-clone-xyz", "zid": "uaa"})))?;
    let decision = filter.authorize(&mut parts);

    let message = decision.error().map(ToString::to_string).unwrap_or_default();
    assert!(decision.is_deny(), "{decision:?}");
    assert!(message.contains("broker.read"), "{message}");
    Ok(())
}

#[test]
fn tenant_policy_allows_trusted_client_with_prefixed_scope() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    registry
        .authorize_type(ObjectType::ServiceInstance)
        .configure("a", "known-client", "-xyz")
        .for_methods([Method::GET])
        .tenant(["broker.read"])
        .register()?;

    let mut parts = request(
        Method::GET,
        "/v1/service_instances/1",
        bearer(json!({"cid": "known-client", "scope": ["a.broker.read"]})),
    )?;
    let decision = registry.filters()[0].authorize(&mut parts);

    assert_eq!(decision, Decision::Allow(AccessLevel::TenantAccess));
    Ok(())
}

#[test]
fn requests_without_bearer_identity_abstain() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    registry
        .authorize_type(ObjectType::Platform)
        .configure("sm", "known-client", "-xyz")
        .for_methods([Method::GET])
        .global(["platform.read"])
        .tenant(["platform.read"])
        .all_tenant(["platform.read"])
        .register()?;
    let filter = &registry.filters()[0];

    let mut anonymous = request(Method::GET, "/v1/platforms", None)?;
    assert_eq!(filter.authorize(&mut anonymous), Decision::Abstain);

    let basic = UserContext::new("admin", AuthenticationType::Basic, json!({"cid": "sm-clone-xyz"}));
    let mut basic = request(Method::GET, "/v1/platforms", Some(basic))?;
    assert_eq!(filter.authorize(&mut basic), Decision::Abstain);
    Ok(())
}

#[test]
fn chained_groups_produce_independent_filters() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    registry
        .authorize_type(ObjectType::ServiceOffering)
        .configure("sm", "known-client", "-xyz")
        .for_methods([Method::GET])
        .global(["s1"])
        .and()
        .for_methods([Method::DELETE])
        .all_tenant(["s2"])
        .register()?;

    let filters = registry.filters();
    assert_eq!(filters.len(), 2);
    assert!(filters.iter().all(|f| f.path().to_string() == "/v1/service_offerings/**"));

    let get = filters.iter().find(|f| f.methods() == [Method::GET]).expect("GET filter");
    let delete = filters.iter().find(|f| f.methods() == [Method::DELETE]).expect("DELETE filter");
    assert!(!get.matchers().matches(&Method::DELETE, "/v1/service_offerings/1"));
    assert!(!delete.matchers().matches(&Method::GET, "/v1/service_offerings/1"));

    let clone = json!({"cid": "ops-xyz", "scope": ["sm.s1", "sm.s2"]});
    let mut parts = request(Method::GET, "/v1/service_offerings/1", bearer(clone.clone()))?;
    assert_eq!(get.authorize(&mut parts), Decision::Allow(AccessLevel::GlobalAccess));

    let mut parts = request(Method::DELETE, "/v1/service_offerings/1", bearer(clone))?;
    assert_eq!(delete.authorize(&mut parts), Decision::Allow(AccessLevel::AllTenantAccess));
    Ok(())
}

#[test]
fn scopes_from_another_tenant_space_do_not_match() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    registry
        .authorize_path("/v1/service_plans/**")
        .configure("b", "known-client", "-xyz")
        .for_methods([Method::GET])
        .tenant(["read"])
        .register()?;

    let mut parts = request(
        Method::GET,
        "/v1/service_plans",
        bearer(json!({"cid": "known-client", "scope": prefix_scopes("a", ["read"])})),
    )?;
    let decision = registry.filters()[0].authorize(&mut parts);

    assert!(matches!(decision, Decision::Deny(AuthzError::MissingScopes { .. })), "{decision:?}");
    Ok(())
}

#[test]
fn custom_authorizers_join_the_alternatives() -> Result<()> {
    let mut registry = FilterRegistry::new(PathTable::default());
    registry
        .authorize_path("/v1/info")
        .custom(required_scopes_authorizer(vec!["info.read".to_string()], AccessLevel::NoAccess))
        .for_methods([Method::GET])
        .register()?;

    let mut parts = request(Method::GET, "/v1/info", bearer(json!({"scope": ["info.read"]})))?;
    assert_eq!(registry.filters()[0].authorize(&mut parts), Decision::Allow(AccessLevel::NoAccess));
    Ok(())
}
