//! Middleware modules for request processing.
//!
//! - [`auth`]: Authentication extractor and the authorization guard
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. [`auth::AuthUser`] validates the JWT and extracts the claims, which
//!    carry the principal's permission snapshot
//! 3. The handler guards itself with `auth_user.require(resource, action, org)`
//!    before touching storage
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//!
//! async fn list_roles(auth_user: AuthUser) -> Result<impl IntoResponse, AppError> {
//!     auth_user.require("role", "view", None)?;
//!     // ...
//! }
//! ```

pub mod auth;
