use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{self, HeaderName, HeaderValue, Method, request::Parts},
    response::IntoResponse,
    routing::get,
};
use platform_api::ApiError;
use platform_authn::{Principal, authenticate, subject_of};
use platform_authz::{AuthzError, Operation, PolicyEngine, Resource, Subject};
use platform_db::DbPool;
use products_hr::HrModule;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{config::AppConfig, rest};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub hr: HrModule,
    pub config: Arc<AppConfig>,
    pub policy: PolicyEngine,
}

impl AppState {
    pub fn new(pool: DbPool, config: Arc<AppConfig>) -> Self {
        let hr = HrModule::new(pool.clone(), config.hr.clone());
        Self {
            pool,
            hr,
            config,
            policy: PolicyEngine::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "org directory listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    let cors = cors_layer(&state.config.cors_allowed_origins);
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", rest::routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

/// The caller behind a request, resolved from the `Authorization` header.
/// A missing header yields an anonymous caller; a bad one is rejected.
#[derive(Clone, Debug)]
pub struct Caller {
    principal: Option<Principal>,
    subject: Subject,
}

impl Caller {
    /// Checks the policy table for `resource` under the request `method`.
    pub fn authorize(
        &self,
        policy: &PolicyEngine,
        resource: Resource,
        method: &Method,
    ) -> Result<(), ApiError> {
        let operation = Operation::for_method(method.as_str());
        policy
            .check(&self.subject, resource, operation)
            .map_err(|err| {
                let caller = self.principal.as_ref().map(|p| p.subject.as_str());
                tracing::debug!(?caller, %resource, ?operation, error = %err, "request denied");
                match err {
                    AuthzError::Unauthenticated => ApiError::Unauthorized(err.to_string()),
                    AuthzError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
                }
            })
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .map(|value| value.to_str())
            .transpose()
            .map_err(|_| ApiError::Unauthorized("malformed authorization header".into()))?;
        let principal = authenticate(header, &state.config.auth)
            .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
        let subject = subject_of(principal.as_ref());
        Ok(Self { principal, subject })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
