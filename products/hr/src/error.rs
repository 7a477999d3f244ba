use std::collections::BTreeMap;

use platform_db::PageError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Field name to messages, in a stable order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub type HrResult<T> = Result<T, HrError>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Error)]
pub enum HrError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("invalid input")]
    Validation(FieldErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid page {page}")]
    InvalidPage { page: u64 },
    #[error(transparent)]
    Db(DbErr),
}

impl HrError {
    pub fn employee_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "employee",
            id,
        }
    }

    pub fn department_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "department",
            id,
        }
    }
}

impl From<DbErr> for HrError {
    fn from(err: DbErr) -> Self {
        // Races past the application-level checks surface as constraint errors.
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(%detail, "unique constraint violated");
                Self::Conflict("a record with the same unique fields already exists".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!(%detail, "foreign key constraint violated");
                Self::Conflict("a referenced record no longer exists".into())
            }
            _ => Self::Db(err),
        }
    }
}

impl From<PageError> for HrError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::OutOfRange { page, .. } => Self::InvalidPage { page },
            PageError::Db(err) => err.into(),
        }
    }
}

/// Collects per-field messages and turns them into [`HrError::Validation`].
#[derive(Debug, Default)]
pub(crate) struct Violations(FieldErrors);

impl Violations {
    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub(crate) fn finish(self) -> HrResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(HrError::Validation(self.0))
        }
    }
}
