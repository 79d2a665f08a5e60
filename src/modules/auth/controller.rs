use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use gatehouse_core::AppError;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    ClientInfo, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse,
};
use super::service;

/// Pulls the caller's address and agent out of the request headers for the
/// security log. Proxied addresses use the first hop of x-forwarded-for.
fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .map(|v| if v == "::1" { "127.0.0.1" } else { v })
        .unwrap_or("0.0.0.0")
        .to_string();

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();

    ClientInfo {
        ip_address,
        user_agent,
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Email already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let client = client_info(&headers);
    let response = service::register_user(&state.db, dto, &client).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account"),
        (status = 422, description = "Validation error")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let client = client_info(&headers);
    let response = service::login_user(&state.db, dto, &client, &state.jwt_config).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = RefreshResponse),
        (status = 401, description = "Invalid refresh token")
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let response = service::refresh_session(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_info_defaults() {
        let headers = HeaderMap::new();
        let client = client_info(&headers);
        assert_eq!(client.ip_address, "0.0.0.0");
        assert_eq!(client.user_agent, "Unknown");
    }

    #[test]
    fn test_client_info_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("user-agent", HeaderValue::from_static("integration-test"));

        let client = client_info(&headers);
        assert_eq!(client.ip_address, "203.0.113.7");
        assert_eq!(client.user_agent, "integration-test");
    }

    #[test]
    fn test_client_info_normalizes_loopback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("::1"));

        let client = client_info(&headers);
        assert_eq!(client.ip_address, "127.0.0.1");
    }
}
