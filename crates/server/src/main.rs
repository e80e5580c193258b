use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{DirectoryEntry, DirectoryRecord, SessionUser, UserId},
    error::{ApiError, ErrorCode},
    protocol::{CreateUserRequest, LoginRequest, UpdateUserRequest},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod auth;
mod config;

use api::ApiContext;
use app_state::AppState;
use auth::{logout_cookie, session_cookie};
use crate::config::{load_settings, normalize_database_url, JwtSettings};

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        auth: settings.jwt.auth_config(),
    };
    if settings.jwt.secret == JwtSettings::default().secret {
        warn!("using the built-in JWT secret; set APP__JWT__SECRET outside development");
    }
    if let Some(dev_user) = &settings.dev_user {
        api::ensure_dev_user(&api, dev_user)
            .await
            .context("failed to seed development user")?;
    }

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> HttpResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HttpResult<impl IntoResponse> {
    let (user, token) = api::login(&state.api, &req).await.map_err(reject)?;
    let cookie = session_cookie(&state.api.auth, &token);
    Ok(([(header::SET_COOKIE, cookie)], Json(user)))
}

async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, logout_cookie(&state.api.auth))],
    )
}

async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> HttpResult<Json<SessionUser>> {
    let user = api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    Ok(Json(user.session_user()))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<Json<Vec<DirectoryEntry>>> {
    api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    let users = api::list_users(&state.api).await.map_err(reject)?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> HttpResult<Json<DirectoryRecord>> {
    api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    let record = api::get_user(&state.api, UserId(id))
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> HttpResult<(StatusCode, Json<DirectoryRecord>)> {
    api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    let record = api::create_user(&state.api, &req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> HttpResult<Json<DirectoryRecord>> {
    api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    let record = api::update_user(&state.api, UserId(id), &req)
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> HttpResult<StatusCode> {
    api::authenticate(&state.api, &headers)
        .await
        .map_err(reject)?;
    api::delete_user(&state.api, UserId(id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
