//! Seeding functionality for the Gatehouse database.
//!
//! - [`catalog`]: default resources (including the `*` wildcard), actions
//!   (including `manage`), and roles (ADMIN / ORGANIZATION ADMIN / MEMBER)
//! - [`admin`]: bootstrap administrator account

pub mod admin;
pub mod catalog;

pub use admin::create_admin;
pub use catalog::seed_catalog;
