//! Client runtime configuration.
//!
//! Resolved once at startup and passed into [`RestBackend`](crate::RestBackend). Nothing in this
//! crate reads environment variables while requests are in flight.

use hms_core::constants::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use hms_core::{HmsError, HmsResult};
use reqwest::Url;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the API rooted at `base_url`.
    ///
    /// A trailing `/` is added when missing so collection paths join under the base rather than
    /// replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] if `base_url` is not an absolute http(s) URL or
    /// `timeout` is zero.
    pub fn new(base_url: &str, timeout: Duration) -> HmsResult<Self> {
        let trimmed = base_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };

        let base_url = Url::parse(&with_slash)
            .map_err(|e| HmsError::Validation(format!("invalid API base URL {trimmed:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(HmsError::Validation(format!(
                "API base URL must use http or https, got {}",
                base_url.scheme()
            )));
        }
        if timeout.is_zero() {
            return Err(HmsError::Validation("request timeout must be positive".into()));
        }

        Ok(Self { base_url, timeout })
    }

    /// Builds a configuration from optional raw values, typically environment variables.
    ///
    /// Missing or blank values fall back to [`DEFAULT_API_BASE_URL`] and
    /// [`DEFAULT_REQUEST_TIMEOUT_SECS`].
    pub fn from_env_values(
        api_url: Option<String>,
        timeout_secs: Option<String>,
    ) -> HmsResult<Self> {
        let api_url = non_blank(api_url).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let timeout_secs = non_blank(timeout_secs)
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    HmsError::Validation(format!(
                        "request timeout must be whole seconds, got {v:?}"
                    ))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self::new(&api_url, Duration::from_secs(timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_added() {
        let cfg = ClientConfig::new("http://hms.local/api", Duration::from_secs(3)).expect("cfg");
        assert_eq!(cfg.base_url().as_str(), "http://hms.local/api/");
        assert_eq!(
            cfg.base_url().join("patients/").expect("join").as_str(),
            "http://hms.local/api/patients/"
        );
    }

    #[test]
    fn missing_values_use_defaults() {
        let cfg = ClientConfig::from_env_values(None, Some("  ".into())).expect("cfg");
        assert_eq!(cfg.base_url().as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_env_values(Some("not a url".into()), None),
            Err(HmsError::Validation(_))
        ));
        assert!(ClientConfig::from_env_values(Some("ftp://hms.local/".into()), None).is_err());
        assert!(ClientConfig::from_env_values(None, Some("soon".into())).is_err());
        assert!(ClientConfig::from_env_values(None, Some("0".into())).is_err());
    }
}
