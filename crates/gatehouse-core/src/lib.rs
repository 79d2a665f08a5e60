//! # Gatehouse Core
//!
//! Core types, errors, and utilities for the Gatehouse API.
//!
//! This crate provides foundational types used throughout the Gatehouse
//! application:
//!
//! - [`authz`]: The permission snapshot contract and the evaluator that
//!   decides whether a principal may perform an action on a resource
//! - [`errors`]: Application error types with HTTP response conversion
//! - [`pagination`]: Pagination utilities for API responses
//! - [`password`]: Secure password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_core::authz::PermissionSnapshot;
//! use gatehouse_core::errors::AppError;
//! use gatehouse_core::password::{hash_password, verify_password};
//!
//! // Gate an operation on the caller's snapshot
//! snapshot.require("user", "edit", Some(org_id))?;
//!
//! // Hash a password
//! let hash = hash_password("secure_password")?;
//! ```

pub mod authz;
pub mod errors;
pub mod pagination;
pub mod password;

// Re-export commonly used types at crate root
pub use authz::{GrantView, MembershipSnapshot, PermissionSnapshot};
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
