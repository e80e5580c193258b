use std::sync::Arc;

use reqwest::{Method, StatusCode};
use shared::{
    domain::SessionUser,
    protocol::{LoginRequest, LOGIN_PATH, LOGOUT_PATH, ME_PATH},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    navigation::{Navigator, Route, SessionState},
    transport::HttpTransport,
};

/// Holds the identity of the signed-in account. The session credential
/// itself lives in the transport's cookie store; this only tracks who it
/// belongs to.
pub struct SessionStore {
    transport: HttpTransport,
    navigator: Arc<dyn Navigator>,
    user: Option<SessionUser>,
}

impl SessionStore {
    pub fn new(transport: HttpTransport, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            navigator,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_user(&self) -> ClientResult<&SessionUser> {
        self.user.as_ref().ok_or(ClientError::SessionAbsent)
    }

    /// On failure the previously held identity is left untouched.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<SessionUser> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let user: SessionUser = self
            .transport
            .send_json(Method::POST, LOGIN_PATH, &request)
            .await
            .map_err(|err| match err.status() {
                Some(StatusCode::UNAUTHORIZED) => ClientError::AuthFailure,
                _ => err,
            })?;

        info!(user_id = %user.id, username = %user.username, "signed in");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Always ends signed out on the login view, even if the server could
    /// not be reached.
    pub async fn logout(&mut self) {
        if let Err(err) = self
            .transport
            .send_empty::<()>(Method::POST, LOGOUT_PATH, None)
            .await
        {
            warn!(error = %err, "logout request failed; clearing local session anyway");
        }
        self.clear();
        self.navigator.redirect(Route::Login);
    }

    /// Asks the server who the current credential belongs to. Any failure
    /// means there is no session, so this never returns an error.
    pub async fn check_session(&mut self) -> ClientResult<Option<SessionUser>> {
        match self.transport.get_json::<SessionUser>(ME_PATH).await {
            Ok(user) => {
                self.user = Some(user.clone());
                Ok(Some(user))
            }
            Err(err) => {
                debug!(error = %err, "session check failed");
                self.user = None;
                Ok(None)
            }
        }
    }

    pub fn clear(&mut self) {
        self.user = None;
    }
}

impl SessionState for SessionStore {
    fn is_authenticated(&self) -> bool {
        SessionStore::is_authenticated(self)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
