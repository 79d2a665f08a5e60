//! # Gatehouse API
//!
//! A multi-tenant administration REST API built with Rust, Axum, and
//! PostgreSQL: organizations, users, roles, resources/actions, permission
//! grants, and a security-event audit trail.
//!
//! ## Overview
//!
//! The interesting part of the system is authorization. At sign-in, a
//! **permission snapshot** is assembled from the store (global admin flag,
//! direct grants, root-organization memberships with role and organization
//! grants) and embedded in the signed access token. Every later decision —
//! "may this principal perform this action on this resource, in this
//! organization?" — is a pure, synchronous evaluation against that snapshot;
//! no authorization check touches the database mid-session.
//!
//! The evaluator lives in [`gatehouse_core::authz`]; the snapshot builder in
//! [`modules::auth::snapshot`]. Route handlers gate themselves with
//! `auth_user.require(resource, action, organization)` before any query.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── gatehouse-core     # errors, pagination, password hashing, authz engine
//! ├── gatehouse-auth     # token claims (snapshot embedded) + JWT helpers
//! ├── gatehouse-config   # env-driven configuration
//! ├── gatehouse-db       # pg pool init
//! └── gatehouse-cli      # seeder (catalog defaults + bootstrap admin)
//! src/
//! ├── middleware/        # AuthUser extractor and guard
//! ├── modules/           # feature modules
//! │   ├── auth/          # register, login, refresh, snapshot builder
//! │   ├── users/
//! │   ├── organizations/
//! │   ├── roles/
//! │   ├── permissions/
//! │   ├── resources/
//! │   ├── actions/
//! │   ├── security_logs/
//! │   └── dashboard/
//! ├── router.rs          # main application router
//! ├── docs.rs            # OpenAPI documentation
//! └── validator.rs       # validated JSON extractor
//! ```
//!
//! Each feature module follows a consistent structure: `model.rs` (data
//! models and DTOs), `service.rs` (business logic), `controller.rs` (HTTP
//! handlers), `router.rs` (route configuration).
//!
//! ## Reserved values
//!
//! - resource slug `*`: matches every resource
//! - action slug `manage`: subsumes every action on the matched resource
//! - global role name `ADMIN`: holders bypass all permission checks
//!
//! ## Security Considerations
//!
//! - Passwords are hashed with bcrypt
//! - Authorization denials return an opaque 403; the refusing rule is never
//!   disclosed to the caller
//! - The snapshot is trusted because the token is signed; grant changes take
//!   effect at the next login or refresh
//! - UI-side affordance checks are cosmetic only — every server operation
//!   re-checks against the snapshot before touching the store

pub mod docs;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use gatehouse_auth;
pub use gatehouse_config;
pub use gatehouse_core;
pub use gatehouse_db;
