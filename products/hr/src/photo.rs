//! Photo references. Binary storage lives elsewhere; the service records the
//! storage path and renders it under the configured media prefix.

use chrono::{Datelike, NaiveDate};

pub const PHOTO_ROOT: &str = "employee_photos";
pub const MAX_PATH_LEN: usize = 255;

/// Resolves a client-supplied photo reference to a storage path.
///
/// A bare file name is namespaced by `uploaded_on`. A path that already
/// carries directories (including one echoed back with the media prefix) is
/// kept as stored.
pub fn storage_path(
    reference: &str,
    media_url: &str,
    uploaded_on: NaiveDate,
) -> Result<String, &'static str> {
    let reference = reference.trim();
    let relative = reference
        .strip_prefix(media_url)
        .filter(|_| !media_url.is_empty())
        .unwrap_or(reference);
    if relative.is_empty() {
        return Err("The submitted file is empty.");
    }
    if relative.starts_with('/') || relative.split('/').any(|part| part == "..") {
        return Err("Invalid file path.");
    }
    let path = if relative.contains('/') {
        relative.to_owned()
    } else {
        format!(
            "{PHOTO_ROOT}/{:04}/{:02}/{:02}/{relative}",
            uploaded_on.year(),
            uploaded_on.month(),
            uploaded_on.day()
        )
    };
    if path.len() > MAX_PATH_LEN {
        return Err("Ensure this filename has at most 255 characters.");
    }
    Ok(path)
}

pub fn public_url(path: &str, media_url: &str) -> String {
    format!("{media_url}{path}")
}
