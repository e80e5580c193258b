//! HTTP plumbing shared by every remote-facing component.
//!
//! There is exactly one place where the HTTP client is built:
//! [`build_http_client`]. It enables the cookie store, so the session cookie
//! set by the login endpoint is attached to every later request made through
//! any clone of the client. Components never add credentials per call.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::ApiError;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub fn build_http_client() -> ClientResult<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .user_agent(concat!("admin-console/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Base URL of the backend; request paths are resolved against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    base: Url,
}

impl ApiEndpoint {
    pub fn parse(server_url: &str) -> ClientResult<Self> {
        let mut base = Url::parse(server_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: ApiEndpoint,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http: build_http_client()?,
            endpoint: ApiEndpoint::parse(server_url)?,
        })
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint.url(path)?))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = send(self.request(Method::GET, path)?).await?;
        Ok(response.json().await?)
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = send(self.request(method, path)?.json(body)).await?;
        Ok(response.json().await?)
    }

    /// For endpoints whose success response carries no body.
    pub async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        send(builder).await?;
        Ok(())
    }
}

async fn send(builder: RequestBuilder) -> ClientResult<Response> {
    let response = builder.send().await?;
    ensure_success(response).await
}

/// Passes 2xx responses through; everything else becomes [`ClientError::Http`]
/// carrying the server's error message when the body is an [`ApiError`].
pub async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => err.message,
        Err(_) if !body.trim().is_empty() => body,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::Http { status, message })
}
