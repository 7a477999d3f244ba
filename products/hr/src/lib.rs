//! HR vertical slice: departments, employees, and the per-department
//! headcount and salary aggregates.

mod body;
mod departments;
mod employees;
mod error;
pub mod money;
pub mod photo;
mod seed;

use chrono::{NaiveDate, Utc};
use platform_db::DbPool;
use serde::Deserialize;

pub use body::{FieldwiseBody, decode_body};
pub use departments::{DepartmentInput, DepartmentPatch, DepartmentView};
pub use employees::{EmployeeFilter, EmployeeInput, EmployeePatch, EmployeeView};
pub use error::{FieldErrors, HrError, HrResult, NON_FIELD_ERRORS};
pub use seed::SeedSummary;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_MEDIA_URL: &str = "/media/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HrSettings {
    pub page_size: u64,
    /// Prefix prepended to stored photo paths in responses.
    pub media_url: String,
}

impl Default for HrSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            media_url: DEFAULT_MEDIA_URL.to_owned(),
        }
    }
}

/// Entry point for the HR resources. Cheap to clone; holds the pool handle.
#[derive(Clone, Debug)]
pub struct HrModule {
    db: DbPool,
    settings: HrSettings,
}

impl HrModule {
    pub fn new(db: DbPool, settings: HrSettings) -> Self {
        Self { db, settings }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Deserializes a present-but-null field as `Some(None)` so partial updates
/// can tell "clear" apart from "leave unchanged".
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims a free-text field; blank input is treated as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_blank_text() {
        assert_eq!(clean(Some("  Ivanov ".into())), Some("Ivanov".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn default_settings_match_documented_values() {
        let settings = HrSettings::default();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.media_url, "/media/");
    }
}
