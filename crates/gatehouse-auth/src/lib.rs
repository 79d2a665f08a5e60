//! # Gatehouse Auth
//!
//! Session token claims and JWT utilities for the Gatehouse API.
//!
//! This crate provides:
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification utilities
//!
//! # Token Types
//!
//! - **Access Token** ([`Claims`]): short-lived; carries the principal's
//!   [`PermissionSnapshot`](gatehouse_core::authz::PermissionSnapshot) so
//!   authorization decisions never hit the database mid-session
//! - **Refresh Token** ([`RefreshTokenClaims`]): long-lived; used to obtain a
//!   fresh access token (and a freshly built snapshot) without
//!   re-authenticating
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_auth::{create_access_token, verify_token};
//! use gatehouse_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "user@example.com", snapshot, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert!(claims.snapshot.allows("user", "view", None));
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
