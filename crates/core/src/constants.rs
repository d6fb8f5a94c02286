//! Constants used throughout the HMS crates.
//!
//! Environment variable names and their defaults live here so the binary and the REST client
//! resolve configuration the same way.

/// Default base URL of the backend API gateway.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "HMS_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "HMS_TIMEOUT_SECS";

/// Environment variable holding the session bearer token.
pub const TOKEN_ENV: &str = "HMS_TOKEN";

/// Environment variable holding the session role.
pub const ROLE_ENV: &str = "HMS_ROLE";

/// Environment variable holding the session user id.
pub const USER_ID_ENV: &str = "HMS_USER_ID";

/// Wire value of the status field in PATCH bodies.
pub const STATUS_FIELD: &str = "status";

/// Wire value of the quantity field on medicines.
pub const QUANTITY_FIELD: &str = "quantity";
