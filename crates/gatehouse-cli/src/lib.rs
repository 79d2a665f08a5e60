//! # Gatehouse CLI
//!
//! Database seeding utilities for Gatehouse bootstrap and development.
//!
//! This library crate provides the seeding functionality used by the CLI
//! binary: the default permission catalog (resources, actions, roles) and
//! the bootstrap admin account.
//!
//! ## Usage
//!
//! ```ignore
//! use gatehouse_cli::seeder;
//!
//! seeder::seed_catalog(&pool).await?;
//! seeder::create_admin(&pool, "admin@example.com", "Super", "Admin", "secret").await?;
//! ```

pub mod seeder;
