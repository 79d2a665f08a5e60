//! Feature modules.
//!
//! Each module follows the same structure:
//!
//! - `model.rs`: database structs, DTOs, response shapes
//! - `service.rs`: business logic and queries
//! - `controller.rs`: HTTP handlers (guard first, then query)
//! - `router.rs`: axum router configuration

pub mod actions;
pub mod auth;
pub mod dashboard;
pub mod organizations;
pub mod permissions;
pub mod resources;
pub mod roles;
pub mod security_logs;
pub mod users;
