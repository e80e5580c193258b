//! Test doubles shared by the client module tests: an in-process mock of the
//! backend HTTP surface and an in-memory directory.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::StatusCode as ReqwestStatus;
use shared::{
    domain::{DirectoryEntry, DirectoryRecord, SessionUser, UserId},
    error::{ApiError, ErrorCode},
    protocol::{CreateUserRequest, LoginRequest, UpdateUserRequest},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    directory::DirectoryClient,
    error::{ClientError, ClientResult},
    navigation::{Navigator, Route},
};

pub(crate) const SESSION_COOKIE: &str = "session=mock-token";

pub(crate) fn record(id: i64, username: &str, first: &str, last: &str, email: &str) -> DirectoryRecord {
    DirectoryRecord {
        id: UserId(id),
        username: username.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
    }
}

pub(crate) fn admin_user() -> SessionUser {
    record(1, "admin", "Ada", "Admin", "admin@example.com").into()
}

#[derive(Default)]
pub(crate) struct MockData {
    pub users: Vec<DirectoryRecord>,
    pub fail_logout: bool,
    pub logout_calls: usize,
    /// Cookie header of every `/api/auth/me` request, in order.
    pub me_cookies: Vec<Option<String>>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    pub data: Arc<Mutex<MockData>>,
}

fn api_error(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    (status, Json(ApiError::new(code, message))).into_response()
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(';').any(|pair| pair.trim() == SESSION_COOKIE))
}

async fn login(Json(req): Json<LoginRequest>) -> Response {
    if req.username == "admin" && req.password == "secret" {
        (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; HttpOnly; Path=/"))],
            Json(admin_user()),
        )
            .into_response()
    } else {
        api_error(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "invalid credentials",
        )
    }
}

async fn logout(State(backend): State<MockBackend>) -> Response {
    let mut data = backend.data.lock().await;
    data.logout_calls += 1;
    if data.fail_logout {
        return api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "logout exploded",
        );
    }
    (
        [(header::SET_COOKIE, "session=; Path=/; Max-Age=0")],
        StatusCode::OK,
    )
        .into_response()
}

async fn me(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.data.lock().await.me_cookies.push(cookie);
    if has_session(&headers) {
        Json(admin_user()).into_response()
    } else {
        api_error(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "authentication required",
        )
    }
}

async fn list_users(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, "authentication required");
    }
    let data = backend.data.lock().await;
    let entries: Vec<DirectoryEntry> = data.users.iter().map(DirectoryRecord::entry).collect();
    Json(entries).into_response()
}

async fn get_user(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    let data = backend.data.lock().await;
    match data.users.iter().find(|u| u.id == UserId(id)) {
        Some(user) => Json(user.clone()).into_response(),
        None => api_error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "user not found"),
    }
}

async fn create_user(
    State(backend): State<MockBackend>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    let mut data = backend.data.lock().await;
    if data.users.iter().any(|u| u.username == req.username) {
        return api_error(StatusCode::CONFLICT, ErrorCode::Conflict, "Username already exists");
    }
    let id = data.users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;
    let created = record(id, &req.username, &req.first_name, &req.last_name, &req.email);
    data.users.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_user(
    State(backend): State<MockBackend>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let mut data = backend.data.lock().await;
    match data.users.iter_mut().find(|u| u.id == UserId(id)) {
        Some(user) => {
            user.first_name = req.first_name;
            user.last_name = req.last_name;
            user.email = req.email;
            Json(user.clone()).into_response()
        }
        None => api_error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "user not found"),
    }
}

async fn delete_user(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    let mut data = backend.data.lock().await;
    let before = data.users.len();
    data.users.retain(|u| u.id != UserId(id));
    if data.users.len() == before {
        api_error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "user not found")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// Starts the mock backend on an ephemeral port and returns its base URL.
pub(crate) async fn spawn_mock_backend(backend: MockBackend) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Records redirects without applying any routing rules.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub redirects: StdMutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        self.redirects.lock().unwrap().push(route);
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectoryState {
    pub users: Vec<DirectoryRecord>,
    pub calls: Vec<String>,
    pub fail_writes: bool,
    pub fail_lists: bool,
}

/// In-memory [`DirectoryClient`] that logs every call.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub state: StdMutex<FakeDirectoryState>,
}

impl FakeDirectory {
    pub fn with_users(users: Vec<DirectoryRecord>) -> Arc<Self> {
        Arc::new(Self {
            state: StdMutex::new(FakeDirectoryState {
                users,
                ..Default::default()
            }),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn set_fail_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_lists = fail;
    }

    fn write_failure() -> ClientError {
        ClientError::Http {
            status: ReqwestStatus::INTERNAL_SERVER_ERROR,
            message: "write rejected".into(),
        }
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_users(&self) -> ClientResult<Vec<DirectoryEntry>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list".into());
        if state.fail_lists {
            return Err(ClientError::Http {
                status: ReqwestStatus::SERVICE_UNAVAILABLE,
                message: "list unavailable".into(),
            });
        }
        Ok(state.users.iter().map(DirectoryRecord::entry).collect())
    }

    async fn get_user(&self, id: UserId) -> ClientResult<DirectoryRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("get {id}"));
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(ClientError::NotFound(id))
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<DirectoryRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {}", request.username));
        if state.fail_writes {
            return Err(Self::write_failure());
        }
        let id = state.users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;
        let created = record(
            id,
            &request.username,
            &request.first_name,
            &request.last_name,
            &request.email,
        );
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(
        &self,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> ClientResult<DirectoryRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update {id}"));
        if state.fail_writes {
            return Err(Self::write_failure());
        }
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ClientError::NotFound(id))?;
        user.first_name = request.first_name.clone();
        user.last_name = request.last_name.clone();
        user.email = request.email.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {id}"));
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            Err(ClientError::NotFound(id))
        } else {
            Ok(())
        }
    }
}
