use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// How the caller proved its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    Basic,
    Bearer,
}

/// Identity resolved for a single request, stored in the request extensions.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub name: String,
    pub authentication_type: AuthenticationType,
    data: Value,
}

impl UserContext {
    pub fn new(name: impl Into<String>, authentication_type: AuthenticationType, data: Value) -> Self {
        Self {
            name: name.into(),
            authentication_type,
            data,
        }
    }

    pub fn bearer(data: Value) -> Self {
        let name = data
            .get("user_name")
            .or_else(|| data.get("cid"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self::new(name, AuthenticationType::Bearer, data)
    }

    /// Deserializes the subset of the claim payload described by `T`.
    pub fn claims<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    pub fn raw_claims(&self) -> &Value {
        &self.data
    }
}

pub fn user_from_parts(parts: &Parts) -> Option<&UserContext> {
    parts.extensions.get::<UserContext>()
}

/// Attaches `user` to the request, replacing any identity already present.
pub fn with_user(parts: &mut Parts, user: UserContext) {
    parts.extensions.insert(user);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Cid {
        cid: String,
    }

    #[test]
    fn test_claims_deserialize_subset() {
        let user = UserContext::bearer(json!({"cid": "sm", "zid": "uaa", "scope": ["a.read"]}));
        let cid: Cid = user.claims().unwrap();
        assert_eq!(cid.cid, "sm");
        assert_eq!(user.name, "sm");
    }

    #[test]
    fn test_claims_type_mismatch_is_error() {
        let user = UserContext::bearer(json!({"cid": 42}));
        assert!(user.claims::<Cid>().is_err());
    }

    #[test]
    fn test_with_user_round_trips_through_extensions() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        assert!(user_from_parts(&parts).is_none());

        with_user(&mut parts, UserContext::new("admin", AuthenticationType::Basic, Value::Null));
        let user = user_from_parts(&parts).unwrap();
        assert_eq!(user.authentication_type, AuthenticationType::Basic);
    }
}
