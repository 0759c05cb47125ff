use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::AppState;
use crate::authz::{normalize_path, with_user, AccessLevel, AuthzMode, ChainOutcome};
use crate::errors::AppError;
use crate::jwt::bearer_token;

/// Attaches a bearer identity to requests carrying a valid token.
///
/// Requests without a bearer token pass through without an identity; the
/// OAuth authorizers abstain for them.
pub async fn identify(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    if let Some(token) = token {
        let user = state.jwt.identity(&token)?;
        with_user(&mut parts, user);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Runs the registered authorization filters and records the granted
/// [`AccessLevel`] in the request extensions.
///
/// Under the API root every request must be admitted by a filter; strict mode
/// rejects requests no filter covers.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let level = match state.authz_mode {
        AuthzMode::Off => AccessLevel::GlobalAccess,
        mode => match state.filters.authorize(&mut parts) {
            ChainOutcome::Unmatched if state.api_root.matches(&normalize_path(parts.uri.path())) => {
                if mode == AuthzMode::Strict {
                    return Err(AppError::unauthorized("no authorization policy covers the request"));
                }
                tracing::warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "no authorization policy covers the request (advisory)"
                );
                AccessLevel::NoAccess
            }
            ChainOutcome::Unmatched => AccessLevel::NoAccess,
            ChainOutcome::Allowed(level) => level,
            ChainOutcome::Denied { filter, error } => {
                if mode == AuthzMode::Strict {
                    return Err(error.into());
                }
                tracing::warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    filter = %filter,
                    error = %error,
                    "authorization denied (advisory)"
                );
                AccessLevel::NoAccess
            }
            ChainOutcome::Abstained => {
                if mode == AuthzMode::Strict {
                    return Err(AppError::unauthorized("no authorization policy admitted the request"));
                }
                tracing::warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "no authorization policy admitted the request (advisory)"
                );
                AccessLevel::NoAccess
            }
        },
    };

    parts.extensions.insert(level);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
