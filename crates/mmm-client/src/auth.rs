use regex::Regex;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use crate::{
    api_interfaces::auth::{LoginRequest, LoginResponse, RelayRequest},
    constants::*,
    cookies::{CookieOptions, CookieStore, SameSite},
    error::LoginError,
};

static BEARER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Bearer (.+)$").expect("Invalid regex pattern"));

const TOKEN_HEADERS: [&str; 2] = ["Authorization", "X-Auth-Token"];

/// Log in and extract the bearer token from the response body or headers.
pub async fn login(
    client: &Client,
    endpoint: &str,
    email: &str,
    password: &str,
) -> Result<String, LoginError> {
    tracing::debug!(%endpoint, "logging in");
    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&LoginRequest { email, password })?)
        .send()
        .await?;
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "login rejected");
        return Err(LoginError::InvalidCredentials);
    }
    let headers = response.headers().clone();
    // The body may be empty when the token is only sent in a header.
    let body = response.text().await.unwrap_or_default();
    let parsed: LoginResponse = serde_json::from_str(&body).unwrap_or_default();
    token_from_body(parsed)
        .or_else(|| token_from_headers(&headers))
        .ok_or(LoginError::MissingToken)
}

fn token_from_body(body: LoginResponse) -> Option<String> {
    body.token
        .or(body.access_token)
        .or(body.data.and_then(|data| data.token))
        .filter(|token| !token.is_empty())
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = TOKEN_HEADERS
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())?;
    let token = match BEARER_REGEX.captures(value) {
        Some(captures) => captures[1].to_string(),
        None => value.to_string(),
    };
    Some(token).filter(|token| !token.is_empty())
}

/// Hand the token to the same-origin endpoint that stores it as an
/// httpOnly cookie.
pub async fn relay_token(client: &Client, endpoint: &str, token: &str) -> Result<(), LoginError> {
    tracing::debug!(%endpoint, "relaying session token");
    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&RelayRequest { token })?)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(LoginError::RelayError(response.status()));
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayRejection {
    #[error("Invalid JSON body")]
    InvalidJson,
    #[error("Token is required")]
    MissingToken,
}

impl RelayRejection {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Check a relay request body the way the relay endpoint does.
pub fn validate_relay_body(body: &str) -> Result<String, RelayRejection> {
    let body: Value = serde_json::from_str(body).map_err(|_| RelayRejection::InvalidJson)?;
    match body.get("token") {
        Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
        _ => Err(RelayRejection::MissingToken),
    }
}

/// Options of the httpOnly cookie the relay sets.
pub fn session_cookie_options() -> CookieOptions {
    CookieOptions {
        days: SESSION_TOKEN_COOKIE_DAYS,
        same_site: SameSite::Lax,
        http_only: true,
        ..CookieOptions::default()
    }
}

/// Store a fresh login in both token cookies and write the jar out.
pub async fn persist_token(store: &mut CookieStore, token: &str) -> Result<(), LoginError> {
    store.set(
        AUTH_TOKEN_COOKIE,
        token,
        &CookieOptions {
            days: AUTH_TOKEN_COOKIE_DAYS,
            ..CookieOptions::default()
        },
    );
    store.set(SESSION_TOKEN_COOKIE, token, &session_cookie_options());
    store.save().await?;
    tracing::info!("login successful, token stored");
    Ok(())
}

/// The stored token, if a non-expired one is present.
pub fn stored_token(store: &CookieStore) -> Option<&str> {
    store
        .get(AUTH_TOKEN_COOKIE)
        .or_else(|| store.get(SESSION_TOKEN_COOKIE))
}
