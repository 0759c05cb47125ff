use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::authz::UserContext;
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours: 24,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            exp_hours,
        })
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let payload = TokenPayload {
            claims,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &payload, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    /// Validates the token and returns its full claim payload.
    pub fn decode(&self, token: &str) -> Result<Value, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // OAuth tokens name their resource servers in `aud`; scopes gate access here
        validation.validate_aud = false;

        jsonwebtoken::decode::<Value>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn identity(&self, token: &str) -> Result<UserContext, AppError> {
        self.decode(token).map(UserContext::bearer)
    }
}

/// OAuth claims issued in test and operator tokens
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenClaims {
    pub cid: String,
    pub zid: String,
    #[serde(rename = "scope", default)]
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

#[derive(serde::Serialize)]
struct TokenPayload<'a> {
    #[serde(flatten)]
    claims: &'a TokenClaims,
    exp: usize,
    iat: usize,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::AuthenticationType;

    #[test]
    fn test_identity_carries_claims() {
        let jwt = JwtConfig::new("test-secret");
        let token = jwt
            .encode(&TokenClaims {
                cid: "sm-clone-xyz".to_string(),
                zid: "uaa".to_string(),
                scopes: vec!["sm.admin.read".to_string()],
                user_name: None,
            })
            .unwrap();

        let user = jwt.identity(&token).unwrap();
        assert_eq!(user.authentication_type, AuthenticationType::Bearer);
        assert_eq!(user.name, "sm-clone-xyz");
        assert_eq!(user.raw_claims()["scope"], serde_json::json!(["sm.admin.read"]));
    }

    #[test]
    fn test_wrong_secret_is_token_error() {
        let token = JwtConfig::new("one").encode(&TokenClaims::default()).unwrap();
        assert!(matches!(JwtConfig::new("two").decode(&token), Err(AppError::Token(_))));
    }

    #[test]
    fn test_audience_claim_is_accepted() {
        let jwt = JwtConfig::new("test-secret");
        let payload = serde_json::json!({
            "cid": "sm-client",
            "aud": ["sm", "openid"],
            "scope": ["sm.instance.read"],
            "exp": chrono::Utc::now().timestamp() + 600,
        });
        let token = jsonwebtoken::encode(&Header::default(), &payload, &EncodingKey::from_secret(b"test-secret")).unwrap();

        let claims = jwt.decode(&token).unwrap();
        assert_eq!(claims["aud"], serde_json::json!(["sm", "openid"]));
        assert_eq!(claims["cid"], "sm-client");
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
    }
}
