use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::authz::PathPattern;
use crate::errors::AppResult;

/// Resource kinds managed by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    ServiceBroker,
    Platform,
    ServiceOffering,
    ServicePlan,
    Visibility,
    Notification,
    ServiceInstance,
}

impl ObjectType {
    pub const ALL: [ObjectType; 7] = [
        ObjectType::ServiceBroker,
        ObjectType::Platform,
        ObjectType::ServiceOffering,
        ObjectType::ServicePlan,
        ObjectType::Visibility,
        ObjectType::Notification,
        ObjectType::ServiceInstance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::ServiceBroker => "service_broker",
            ObjectType::Platform => "platform",
            ObjectType::ServiceOffering => "service_offering",
            ObjectType::ServicePlan => "service_plan",
            ObjectType::Visibility => "visibility",
            ObjectType::Notification => "notification",
            ObjectType::ServiceInstance => "service_instance",
        }
    }

    /// Collection segment under `/v1`
    pub fn collection(&self) -> &'static str {
        match self {
            ObjectType::ServiceBroker => "service_brokers",
            ObjectType::Platform => "platforms",
            ObjectType::ServiceOffering => "service_offerings",
            ObjectType::ServicePlan => "service_plans",
            ObjectType::Visibility => "visibilities",
            ObjectType::Notification => "notifications",
            ObjectType::ServiceInstance => "service_instances",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.collection() == segment)
    }

    pub fn url(&self) -> String {
        format!("/v1/{}", self.collection())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only mapping from resource type to the path pattern guarding it
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    paths: HashMap<ObjectType, PathPattern>,
}

impl PathTable {
    /// Every resource type mapped to its collection and everything beneath it.
    pub fn service_manager() -> Self {
        let paths = ObjectType::ALL
            .into_iter()
            .map(|t| (t, PathPattern::recursive(&t.url())))
            .collect();
        Self { paths }
    }

    pub fn with(mut self, object_type: ObjectType, pattern: &str) -> AppResult<Self> {
        self.paths.insert(object_type, PathPattern::parse(pattern)?);
        Ok(self)
    }

    pub fn get(&self, object_type: ObjectType) -> Option<&PathPattern> {
        self.paths.get(&object_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_manager_table_covers_every_type() {
        let table = PathTable::service_manager();
        for object_type in ObjectType::ALL {
            let pattern = table.get(object_type).unwrap();
            assert_eq!(pattern.to_string(), format!("{}/**", object_type.url()));
        }
    }

    #[test]
    fn test_override_replaces_pattern() {
        let table = PathTable::default().with(ObjectType::Platform, "/v2/platforms/**").unwrap();
        assert!(table.get(ObjectType::Platform).unwrap().matches("/v2/platforms/1"));
        assert!(table.get(ObjectType::ServiceBroker).is_none());
    }

    #[test]
    fn test_collection_lookup() {
        assert_eq!(ObjectType::from_collection("visibilities"), Some(ObjectType::Visibility));
        assert_eq!(ObjectType::from_collection("widgets"), None);
    }
}
