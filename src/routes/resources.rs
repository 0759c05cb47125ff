//! Placeholder resource handlers that report what the authorization layer
//! granted. Storage is owned by another service.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::authz::AccessLevel;
use crate::errors::{AppError, AppResult};
use crate::models::ObjectType;

#[derive(Debug, Serialize)]
pub struct ResourceAccess {
    pub resource: ObjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub access_level: AccessLevel,
}

fn resolve(collection: &str) -> AppResult<ObjectType> {
    ObjectType::from_collection(collection)
        .ok_or_else(|| AppError::not_found(format!("unknown resource '{collection}'")))
}

pub async fn list(
    Path(resource): Path<String>,
    Extension(access_level): Extension<AccessLevel>,
) -> AppResult<Json<ResourceAccess>> {
    Ok(Json(ResourceAccess {
        resource: resolve(&resource)?,
        id: None,
        access_level,
    }))
}

pub async fn create(
    Path(resource): Path<String>,
    Extension(access_level): Extension<AccessLevel>,
) -> AppResult<(StatusCode, Json<ResourceAccess>)> {
    Ok((
        StatusCode::CREATED,
        Json(ResourceAccess {
            resource: resolve(&resource)?,
            id: None,
            access_level,
        }),
    ))
}

pub async fn get(
    Path((resource, id)): Path<(String, String)>,
    Extension(access_level): Extension<AccessLevel>,
) -> AppResult<Json<ResourceAccess>> {
    Ok(Json(ResourceAccess {
        resource: resolve(&resource)?,
        id: Some(id),
        access_level,
    }))
}

pub async fn update(
    Path((resource, id)): Path<(String, String)>,
    Extension(access_level): Extension<AccessLevel>,
) -> AppResult<Json<ResourceAccess>> {
    get(Path((resource, id)), Extension(access_level)).await
}

pub async fn delete(
    Path((resource, id)): Path<(String, String)>,
    Extension(access_level): Extension<AccessLevel>,
) -> AppResult<StatusCode> {
    resolve(&resource)?;
    tracing::debug!(resource = %resource, id = %id, access_level = access_level.as_str(), "delete accepted");
    Ok(StatusCode::NO_CONTENT)
}
