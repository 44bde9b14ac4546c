use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Raw login response. The token may live in any of these places.
#[derive(Deserialize, Default)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub data: Option<LoginData>,
}

#[derive(Deserialize, Default)]
pub struct LoginData {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct RelayRequest<'a> {
    pub token: &'a str,
}
