//! Tool Market Core - Shared types library.
//!
//! This crate provides the domain types used across all Tool Market components:
//! - `server` - HTTP API for the tools marketplace
//! - `cli` - Command-line tools for migrations, admin bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. `sqlx` encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
