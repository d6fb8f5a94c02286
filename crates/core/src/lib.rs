//! # HMS Core
//!
//! Client-side business logic for the hospital management system.
//!
//! This crate contains the rules a client must apply on top of the backend API:
//! - Status lifecycles for appointments, lab requests, prescriptions and insurance claims
//! - Cross-resource joins for pages that show related collections together
//! - A generic resource manager and the workflows built on it (transitions, lab completion,
//!   pharmacy purchases)
//! - Per-role page data
//!
//! **No transport concerns**: HTTP lives in `hms-client`, which implements [`Backend`]. The
//! in-memory [`InMemoryBackend`] implements the same trait for tests and offline use.

pub mod auth;
pub mod backend;
pub mod constants;
pub mod error;
pub mod joins;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod resources;
pub mod services;
pub mod views;

pub use auth::AuthContext;
pub use backend::{Backend, Filter};
pub use error::{HmsError, HmsResult};
pub use hms_types;
pub use memory::InMemoryBackend;
pub use models::{Resource, ResourceKind, Tracked};
pub use resources::ResourceManager;
