//! `/api` resources.

mod departments;
mod employees;

use axum::{Router, routing::get};
use platform_api::ApiError;
use products_hr::HrError;

use crate::http::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employee", get(employees::list).post(employees::create))
        .route(
            "/employee/{id}",
            get(employees::retrieve)
                .put(employees::update)
                .patch(employees::partial_update)
                .delete(employees::destroy),
        )
        .route("/department", get(departments::list).post(departments::create))
        .route(
            "/department/{id}",
            get(departments::retrieve)
                .put(departments::update)
                .patch(departments::partial_update)
                .delete(departments::destroy),
        )
}

/// Maps domain failures onto HTTP errors.
fn hr_error(err: HrError) -> ApiError {
    match err {
        HrError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        HrError::Validation(errors) => ApiError::Validation(errors),
        HrError::Conflict(message) => ApiError::Conflict(message),
        HrError::InvalidPage { .. } => ApiError::NotFound("Invalid page.".into()),
        HrError::Db(err) => ApiError::internal(anyhow::Error::new(err).context("database error")),
    }
}
