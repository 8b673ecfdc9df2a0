//! AppleGym Core - Shared types library.
//!
//! This crate provides common types used across all AppleGym components:
//! - `storefront` - Public-facing shop and admin dashboard
//! - `cli` - Command-line tools for migrations and report export
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and wire enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
