use crate::authz::{AuthzMode, TenantConfig};
use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;

/// Settings loaded from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub authz_mode: AuthzMode,
    pub tenant: TenantConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let port = std::env::var("APP_PORT")
            .map(|val| val.parse::<u16>())
            .unwrap_or(Ok(DEFAULT_PORT))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        let authz_mode = match std::env::var("AUTHZ_MODE") {
            Ok(value) => AuthzMode::parse(&value).ok_or_else(|| {
                AppError::configuration(format!("AUTHZ_MODE '{value}' must be one of off, advisory, strict"))
            })?,
            Err(_) => AuthzMode::default(),
        };

        let tenant = TenantConfig::new(
            required_var("AUTHZ_CLONE_SPACE")?,
            required_var("AUTHZ_CLIENT_ID")?,
            required_var("AUTHZ_TRUSTED_CLIENT_SUFFIX")?,
        );

        let settings = Self {
            port,
            authz_mode,
            tenant,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.tenant.clone_space.trim().is_empty() {
            return Err(AppError::configuration("validate Settings: clone space must not be empty"));
        }
        if self.tenant.client_id.trim().is_empty() {
            return Err(AppError::configuration("validate Settings: client id must not be empty"));
        }
        if self.tenant.trusted_client_id_suffix.trim().is_empty() {
            return Err(AppError::configuration(
                "validate Settings: trusted client id suffix must not be empty",
            ));
        }
        Ok(())
    }
}

fn required_var(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::configuration(format!("{name} not set")))
}
