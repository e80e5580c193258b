use axum::http::HeaderMap;
use shared::{
    domain::{DirectoryEntry, DirectoryRecord, SessionUser, UserId},
    error::{ApiError, ErrorCode},
    protocol::{CreateUserRequest, LoginRequest, UpdateUserRequest},
};
use storage::{
    is_unique_violation,
    password::{hash_password, verify_password},
    NewUser, Storage, StoredUser,
};
use tracing::info;

use crate::{
    auth::{mint_session_token, session_token_from_headers, verify_session_token, AuthConfig},
    config::DevUserSettings,
};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub auth: AuthConfig,
}

/// Checks credentials and mints a session token for the account.
pub async fn login(
    ctx: &ApiContext,
    req: &LoginRequest,
) -> Result<(SessionUser, String), ApiError> {
    let invalid = || ApiError::new(ErrorCode::Unauthorized, "invalid credentials");

    let user = ctx
        .storage
        .find_by_username(&req.username)
        .await
        .map_err(internal)?
        .filter(|user| user.enabled)
        .ok_or_else(invalid)?;
    let (password, hash) = (req.password.clone(), user.password_hash.clone());
    if !blocking(move || verify_password(&password, &hash))
        .await
        .map_err(internal)?
    {
        return Err(invalid());
    }

    let token = mint_session_token(&ctx.auth, &user)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("token mint failed: {e}")))?;
    info!(username = %user.username, "user signed in");
    Ok((user.session_user(), token))
}

/// Resolves the session cookie to a live account. A valid session for an
/// account disabled since sign-in is `Forbidden`.
pub async fn authenticate(ctx: &ApiContext, headers: &HeaderMap) -> Result<StoredUser, ApiError> {
    let claims = session_token_from_headers(headers, &ctx.auth.cookie_name)
        .and_then(|token| verify_session_token(&ctx.auth, token))
        .ok_or_else(ApiError::unauthorized)?;
    let user = ctx
        .storage
        .find_by_username(&claims.sub)
        .await
        .map_err(internal)?
        .filter(|user| user.user_id.0 == claims.uid)
        .ok_or_else(ApiError::unauthorized)?;
    if !user.enabled {
        return Err(ApiError::new(ErrorCode::Forbidden, "account is disabled"));
    }
    Ok(user)
}

pub async fn list_users(ctx: &ApiContext) -> Result<Vec<DirectoryEntry>, ApiError> {
    let users = ctx.storage.list_users().await.map_err(internal)?;
    Ok(users.iter().map(StoredUser::entry).collect())
}

pub async fn get_user(ctx: &ApiContext, user_id: UserId) -> Result<DirectoryRecord, ApiError> {
    load_existing(ctx, user_id).await.map(|user| user.record())
}

pub async fn create_user(
    ctx: &ApiContext,
    req: &CreateUserRequest,
) -> Result<DirectoryRecord, ApiError> {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }
    if ctx
        .storage
        .username_exists(&req.username)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::new(ErrorCode::Conflict, "Username already exists"));
    }
    if ctx.storage.email_exists(&req.email).await.map_err(internal)? {
        return Err(ApiError::new(ErrorCode::Conflict, "Email already exists"));
    }

    let password = req.password.clone();
    let password_hash = blocking(move || hash_password(&password))
        .await
        .map_err(internal)?;
    let inserted = ctx
        .storage
        .create_user(NewUser {
            username: &req.username,
            email: &req.email,
            first_name: &req.first_name,
            last_name: &req.last_name,
            password_hash: &password_hash,
        })
        .await;
    // The existence checks above race with concurrent creates; the UNIQUE
    // constraints have the final word.
    let user_id = match inserted {
        Ok(user_id) => user_id,
        Err(err) if is_unique_violation(&err) => {
            let taken = ctx
                .storage
                .username_exists(&req.username)
                .await
                .map_err(internal)?;
            let message = if taken {
                "Username already exists"
            } else {
                "Email already exists"
            };
            return Err(ApiError::new(ErrorCode::Conflict, message));
        }
        Err(err) => return Err(internal(err)),
    };
    info!(user_id = user_id.0, username = %req.username, "user created");
    get_user(ctx, user_id).await
}

pub async fn update_user(
    ctx: &ApiContext,
    user_id: UserId,
    req: &UpdateUserRequest,
) -> Result<DirectoryRecord, ApiError> {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }
    let existing = load_existing(ctx, user_id).await?;
    if existing.email != req.email && ctx.storage.email_exists(&req.email).await.map_err(internal)? {
        return Err(ApiError::new(ErrorCode::Conflict, "Email already exists"));
    }

    ctx.storage
        .update_profile(user_id, &req.first_name, &req.last_name, &req.email)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::new(ErrorCode::Conflict, "Email already exists")
            } else {
                internal(err)
            }
        })?;
    get_user(ctx, user_id).await
}

pub async fn delete_user(ctx: &ApiContext, user_id: UserId) -> Result<(), ApiError> {
    if !ctx.storage.delete_user(user_id).await.map_err(internal)? {
        return Err(ApiError::not_found("User not found"));
    }
    info!(user_id = user_id.0, "user deleted");
    Ok(())
}

/// Creates the configured development account if it does not exist yet.
/// Returns whether an account was created.
pub async fn ensure_dev_user(ctx: &ApiContext, dev: &DevUserSettings) -> anyhow::Result<bool> {
    if ctx.storage.username_exists(&dev.username).await? {
        info!(username = %dev.username, "development user already exists");
        return Ok(false);
    }

    let password = dev.password.clone();
    let password_hash = blocking(move || hash_password(&password)).await?;
    ctx.storage
        .create_user(NewUser {
            username: &dev.username,
            email: &dev.email,
            first_name: "Dev",
            last_name: "User",
            password_hash: &password_hash,
        })
        .await?;
    info!(username = %dev.username, "development user created");
    Ok(true)
}

async fn load_existing(ctx: &ApiContext, user_id: UserId) -> Result<StoredUser, ApiError> {
    ctx.storage
        .load_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Argon2 is CPU-bound; run it on the blocking pool.
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
