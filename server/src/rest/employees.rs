use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode},
};
use platform_api::{ApiError, ApiResult, PageBody};
use platform_authz::Resource;
use products_hr::{EmployeeFilter, EmployeeInput, EmployeePatch, EmployeeView, decode_body};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::hr_error;
use crate::http::{AppState, Caller};

const COLLECTION_PATH: &str = "/api/employee";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    department: Option<String>,
    surname: Option<String>,
}

/// Page numbers are one-based; anything else names no page.
pub(super) fn page_number(raw: Option<&str>) -> ApiResult<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|page| *page > 0)
            .ok_or_else(|| ApiError::NotFound("Invalid page.".into())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<PageBody<EmployeeView>>> {
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Query(params) = params?;
    let page = page_number(params.page.as_deref())?;
    let filter = EmployeeFilter {
        department: params.department,
        surname: params.surname,
    };
    let paged = state
        .hr
        .list_employees(&filter, page)
        .await
        .map_err(hr_error)?;
    Ok(Json(PageBody::new(
        paged,
        COLLECTION_PATH,
        &[
            ("department", filter.department.as_deref()),
            ("surname", filter.surname.as_deref()),
        ],
    )))
}

pub async fn retrieve(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EmployeeView>> {
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Path(id) = id?;
    let view = state.hr.get_employee(id).await.map_err(hr_error)?;
    Ok(Json(view))
}

pub async fn create(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmployeeView>)> {
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Json(raw) = body?;
    let input: EmployeeInput = decode_body(raw).map_err(hr_error)?;
    let view = state.hr.create_employee(input).await.map_err(hr_error)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<EmployeeView>> {
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Path(id) = id?;
    let Json(raw) = body?;
    let input: EmployeeInput = decode_body(raw).map_err(hr_error)?;
    let view = state
        .hr
        .update_employee(id, input)
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
) -> ApiResult<Json<EmployeeView>> {
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Path(id) = id?;
    let Json(raw) = body?;
    let patch: EmployeePatch = decode_body(raw).map_err(hr_error)?;
    let view = state
        .hr
        .patch_employee(id, patch)
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
    caller.authorize(&state.policy, Resource::Employee, &method)?;
    let Path(id) = id?;
    state.hr.delete_employee(id).await.map_err(hr_error)?;
    Ok(StatusCode::NO_CONTENT)
}
