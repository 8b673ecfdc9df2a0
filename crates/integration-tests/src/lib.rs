//! Integration tests for the AppleGym storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p applegym-integration-tests
//! ```
//!
//! Nothing external is required. [`MockBackend`] serves a canned AppleGym REST
//! API on an ephemeral port and records what the storefront sent it, and
//! [`TestStorefront`] runs the real router against it with in-memory
//! sessions.
//!
//! # Test Categories
//!
//! - `api_client` - `ApiClient` against the mock backend
//! - `checkout` - the cart-to-sale flow
//! - `reports` - dashboard loading and report export
//! - `storefront` - browser-level flows through the HTTP server

pub mod backend;
pub mod storefront;

pub use backend::{Behavior, MockBackend, Recorded};
pub use storefront::TestStorefront;
