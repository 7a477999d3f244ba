use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use axum::http::HeaderValue;
use platform_authn::AuthConfig;
use platform_db::MAX_PAGE_SIZE;
use products_hr::{DEFAULT_MEDIA_URL, DEFAULT_PAGE_SIZE, HrSettings};
use url::Url;

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Environment lookup; the process environment in production, a map in tests.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub hr: HrSettings,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<HeaderValue>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            auth: auth_settings(lookup)?,
            hr: hr_settings(lookup)?,
            cors_allowed_origins: cors_origins(lookup)?,
        })
    }
}

/// `AUTH_SECRET` (required) and `TOKEN_TTL_MINUTES`.
pub fn auth_settings(lookup: Lookup<'_>) -> Result<AuthConfig> {
    let secret = env_required(lookup, "AUTH_SECRET")?;
    let ttl = env_parsed(lookup, "TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;
    if ttl <= 0 {
        return Err(anyhow!("TOKEN_TTL_MINUTES must be positive"));
    }
    AuthConfig::new(secret.into_bytes(), ttl).context("invalid AUTH_SECRET")
}

/// `PAGE_SIZE` and `MEDIA_URL`.
pub fn hr_settings(lookup: Lookup<'_>) -> Result<HrSettings> {
    let page_size = env_parsed(lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(anyhow!("PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}"));
    }
    let mut media_url = lookup("MEDIA_URL")
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_owned());
    if !media_url.ends_with('/') {
        media_url.push('/');
    }
    Ok(HrSettings {
        page_size,
        media_url,
    })
}

/// Comma-separated `CORS_ALLOWED_ORIGINS`; any malformed entry fails the load.
fn cors_origins(lookup: Lookup<'_>) -> Result<Vec<HeaderValue>> {
    lookup("CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(parse_origin)
        .collect()
}

fn parse_origin(raw: &str) -> Result<HeaderValue> {
    let url = Url::parse(raw).with_context(|| format!("invalid CORS origin: {raw}"))?;
    let bare = matches!(url.path(), "" | "/") && url.query().is_none() && url.fragment().is_none();
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() || !bare {
        bail!("invalid CORS origin: {raw} (expected scheme://host[:port])");
    }
    HeaderValue::from_str(&url.origin().ascii_serialization())
        .with_context(|| format!("invalid CORS origin: {raw}"))
}

fn env_required(lookup: Lookup<'_>, key: &str) -> Result<String> {
    lookup(key).ok_or_else(|| anyhow!("missing env {key}"))
}

fn env_parsed<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw}")),
        None => Ok(default),
    }
}
