use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{Method, StatusCode},
};
use platform_api::ApiResult;
use platform_authz::Resource;
use products_hr::{DepartmentInput, DepartmentPatch, DepartmentView, decode_body};
use serde_json::Value;
use uuid::Uuid;

use super::hr_error;
use crate::http::{AppState, Caller};

pub async fn list(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
) -> ApiResult<Json<Vec<DepartmentView>>> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let departments = state.hr.list_departments().await.map_err(hr_error)?;
    Ok(Json(departments))
}

pub async fn retrieve(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<DepartmentView>> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let Path(id) = id?;
    let view = state.hr.get_department(id).await.map_err(hr_error)?;
    Ok(Json(view))
}

pub async fn create(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DepartmentView>)> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let Json(raw) = body?;
    let input: DepartmentInput = decode_body(raw).map_err(hr_error)?;
    let view = state.hr.create_department(input).await.map_err(hr_error)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DepartmentView>> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let Path(id) = id?;
    let Json(raw) = body?;
    let input: DepartmentInput = decode_body(raw).map_err(hr_error)?;
    let view = state
        .hr
        .update_department(id, input)
        .await
        .map_err(hr_error)?;
    Ok(Json(view))
}

pub async fn partial_update(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DepartmentView>> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let Path(id) = id?;
    let Json(raw) = body?;
    let patch: DepartmentPatch = decode_body(raw).map_err(hr_error)?;
    let view = state
        .hr
        .patch_department(id, patch)
        .await
        .map_err(hr_error)?;
    Ok(Json(view))
}

pub async fn destroy(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    caller.authorize(&state.policy, Resource::Department, &method)?;
    let Path(id) = id?;
    state.hr.delete_department(id).await.map_err(hr_error)?;
    Ok(StatusCode::NO_CONTENT)
}
