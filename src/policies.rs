use axum::http::Method;

use crate::authz::{scopes, FilterRegistry, TenantConfig};
use crate::errors::AppResult;
use crate::models::ObjectType;

const READ: [Method; 1] = [Method::GET];
const WRITE: [Method; 3] = [Method::POST, Method::PATCH, Method::DELETE];

/// Registers the default control plane policies.
///
/// Platform-level resources are admin only. The catalog and service
/// instances are additionally visible per tenant.
pub fn register_defaults(registry: &mut FilterRegistry, tenant: &TenantConfig) -> AppResult<()> {
    for object_type in [
        ObjectType::ServiceBroker,
        ObjectType::Platform,
        ObjectType::Visibility,
        ObjectType::Notification,
    ] {
        registry
            .authorize_type(object_type)
            .with_tenant(tenant.clone())
            .for_methods(READ)
            .global([scopes::ADMIN_READ])
            .and()
            .for_methods(WRITE)
            .global([scopes::ADMIN_WRITE])
            .register()?;
    }

    for object_type in [ObjectType::ServiceOffering, ObjectType::ServicePlan] {
        registry
            .authorize_type(object_type)
            .with_tenant(tenant.clone())
            .for_methods(READ)
            .tenant([scopes::CATALOG_READ])
            .all_tenant([scopes::CATALOG_READ_ALL])
            .global([scopes::ADMIN_READ])
            .and()
            .for_methods(WRITE)
            .global([scopes::ADMIN_WRITE])
            .register()?;
    }

    registry
        .authorize_type(ObjectType::ServiceInstance)
        .with_tenant(tenant.clone())
        .for_methods(READ)
        .tenant([scopes::INSTANCE_READ])
        .all_tenant([scopes::INSTANCE_READ_ALL])
        .global([scopes::ADMIN_READ])
        .and()
        .for_methods(WRITE)
        .tenant([scopes::INSTANCE_WRITE])
        .global([scopes::ADMIN_WRITE])
        .register()?;

    tracing::info!(filters = registry.filters().len(), "default authorization policies registered");
    Ok(())
}
