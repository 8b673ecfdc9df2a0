//! AppleGym Storefront library.
//!
//! Server-rendered shop and admin reports dashboard in front of the AppleGym
//! REST backend. The binary in `main.rs` wires these modules into a server;
//! the integration tests drive them directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod charts;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod routes;
pub mod state;
pub mod token;
