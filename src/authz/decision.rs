use serde::{Deserialize, Serialize};

use crate::errors::AuthzError;

/// Breadth of resources visible to an admitted request.
///
/// The variants are not ordered. A level is only a grant when it arrives
/// inside `Decision::Allow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    NoAccess,
    /// Resources owned by the caller's tenant
    TenantAccess,
    /// Tenant-scoped resources across every tenant
    AllTenantAccess,
    /// Everything, including platform-level resources
    GlobalAccess,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::NoAccess => "no_access",
            AccessLevel::TenantAccess => "tenant_access",
            AccessLevel::AllTenantAccess => "all_tenant_access",
            AccessLevel::GlobalAccess => "global_access",
        }
    }
}

/// Outcome of a single authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request satisfies the check
    Allow(AccessLevel),
    /// The request explicitly fails the check
    Deny(AuthzError),
    /// The check does not apply to this request
    Abstain,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny(_))
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Decision::Abstain)
    }

    /// Granted level; `NoAccess` unless the decision is `Allow`.
    pub fn access_level(&self) -> AccessLevel {
        match self {
            Decision::Allow(level) => *level,
            Decision::Deny(_) | Decision::Abstain => AccessLevel::NoAccess,
        }
    }

    pub fn error(&self) -> Option<&AuthzError> {
        match self {
            Decision::Deny(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Allow(_) => "allow",
            Decision::Deny(_) => "deny",
            Decision::Abstain => "abstain",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_allow_carries_a_grant() {
        assert_eq!(Decision::Allow(AccessLevel::TenantAccess).access_level(), AccessLevel::TenantAccess);
        assert_eq!(Decision::Abstain.access_level(), AccessLevel::NoAccess);
        let deny = Decision::Deny(AuthzError::invalid_token("eof"));
        assert_eq!(deny.access_level(), AccessLevel::NoAccess);
        assert!(deny.error().is_some());
    }

    #[test]
    fn test_access_level_serializes_snake_case() {
        let v = serde_json::to_value(AccessLevel::AllTenantAccess).unwrap();
        assert_eq!(v, serde_json::json!("all_tenant_access"));
        assert_eq!(AccessLevel::AllTenantAccess.as_str(), "all_tenant_access");
    }
}
