//! # HMS Client
//!
//! REST transport for the hospital management backend.
//!
//! Handles:
//! - Startup configuration (base URL, request timeout)
//! - The reqwest-based [`RestBackend`], which implements `hms_core::Backend`
//! - Mapping HTTP status codes and bodies onto `HmsError`

#![warn(rust_2018_idioms)]

pub mod config;
pub mod rest;

pub use config::ClientConfig;
pub use rest::RestBackend;
