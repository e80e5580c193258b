use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use shared::{
    domain::{DirectoryEntry, DirectoryRecord, UserId},
    protocol::{user_path, CreateUserRequest, UpdateUserRequest, USERS_PATH},
};

use crate::{
    error::{ClientError, ClientResult},
    transport::HttpTransport,
};

/// Remote CRUD over user accounts. Failures are passed through without
/// retries; only a 404 on a single record is given its own variant.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_users(&self) -> ClientResult<Vec<DirectoryEntry>>;
    async fn get_user(&self, id: UserId) -> ClientResult<DirectoryRecord>;
    async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<DirectoryRecord>;
    async fn update_user(
        &self,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> ClientResult<DirectoryRecord>;
    async fn delete_user(&self, id: UserId) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    transport: HttpTransport,
}

impl HttpDirectoryClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

fn not_found_as(id: UserId) -> impl FnOnce(ClientError) -> ClientError {
    move |err| match err.status() {
        Some(StatusCode::NOT_FOUND) => ClientError::NotFound(id),
        _ => err,
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_users(&self) -> ClientResult<Vec<DirectoryEntry>> {
        self.transport.get_json(USERS_PATH).await
    }

    async fn get_user(&self, id: UserId) -> ClientResult<DirectoryRecord> {
        self.transport
            .get_json(&user_path(id))
            .await
            .map_err(not_found_as(id))
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<DirectoryRecord> {
        self.transport
            .send_json(Method::POST, USERS_PATH, request)
            .await
    }

    async fn update_user(
        &self,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> ClientResult<DirectoryRecord> {
        self.transport
            .send_json(Method::PUT, &user_path(id), request)
            .await
            .map_err(not_found_as(id))
    }

    async fn delete_user(&self, id: UserId) -> ClientResult<()> {
        self.transport
            .send_empty::<()>(Method::DELETE, &user_path(id), None)
            .await
            .map_err(not_found_as(id))
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
