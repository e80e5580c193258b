//! Session tokens carried in an HttpOnly cookie.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use storage::StoredUser;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub cookie_name: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub uid: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn mint_session_token(
    cfg: &AuthConfig,
    user: &StoredUser,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = SessionClaims {
        sub: user.username.clone(),
        uid: user.user_id.0,
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

/// Expired, tampered or otherwise undecodable tokens yield `None`.
pub fn verify_session_token(cfg: &AuthConfig, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn session_cookie(cfg: &AuthConfig, token: &str) -> String {
    format!(
        "{}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        cfg.cookie_name, cfg.ttl_seconds
    )
}

pub fn logout_cookie(cfg: &AuthConfig) -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", cfg.cookie_name)
}

pub fn session_token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
