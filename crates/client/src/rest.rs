//! [`Backend`] over the HMS REST API.
//!
//! Collections live at `{base}{collection}/` and records at `{base}{collection}/{id}/`. Every
//! request carries `Authorization: Bearer <token>` when the session has a token.
//!
//! Non-2xx replies are mapped onto the error taxonomy:
//!
//! | Status        | Error                                                   |
//! |---------------|---------------------------------------------------------|
//! | 404           | `NotFound` (or `Network` for a collection URL)          |
//! | 400 with JSON | `Validation`, carrying `detail` or the field messages   |
//! | 401, 403      | `Forbidden`                                             |
//! | anything else | `Network`                                               |

use crate::config::ClientConfig;
use hms_core::backend::{Backend, Filter};
use hms_core::{AuthContext, HmsError, HmsResult, Resource, ResourceKind};
use hms_types::RecordId;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RestBackend {
    /// # Errors
    ///
    /// Returns [`HmsError::Network`] if the HTTP client cannot be initialised (for example when
    /// no TLS backend is available).
    pub fn new(config: ClientConfig) -> HmsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HmsError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn collection_url(&self, kind: ResourceKind) -> HmsResult<Url> {
        self.join(&format!("{}/", kind.collection()))
    }

    fn record_url(&self, kind: ResourceKind, id: RecordId) -> HmsResult<Url> {
        self.join(&format!("{}/{id}/", kind.collection()))
    }

    fn join(&self, path: &str) -> HmsResult<Url> {
        self.config
            .base_url()
            .join(path)
            .map_err(|e| HmsError::Validation(format!("cannot build URL for {path}: {e}")))
    }

    fn request(&self, method: Method, url: Url, auth: &AuthContext) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match auth.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder` and returns the body of a 2xx reply.
    async fn send(
        &self,
        builder: RequestBuilder,
        kind: ResourceKind,
        id: Option<RecordId>,
    ) -> HmsResult<Vec<u8>> {
        let request = builder
            .build()
            .map_err(|e| HmsError::Network(format!("invalid {kind} request: {e}")))?;
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!("{} {}", method, url);

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            HmsError::Network(format!("{method} {url}: {e}"))
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| HmsError::Network(format!("{method} {url}: reading body: {e}")))?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        tracing::warn!("{} {} returned {}", method, url, status);
        Err(error_for_status(status, &body, kind, id, &format!("{method} {url}")))
    }
}

/// Maps a non-2xx reply onto [`HmsError`].
fn error_for_status(
    status: StatusCode,
    body: &[u8],
    kind: ResourceKind,
    id: Option<RecordId>,
    request: &str,
) -> HmsError {
    let json: Option<Value> = serde_json::from_slice(body).ok();
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => HmsError::NotFound { kind, id },
        (StatusCode::BAD_REQUEST, _) => match json.as_ref().and_then(describe_error_body) {
            Some(message) => HmsError::Validation(message),
            None => HmsError::Network(format!("{request} returned {status} without a JSON body")),
        },
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            let detail = json
                .as_ref()
                .and_then(describe_error_body)
                .unwrap_or_else(|| status.to_string());
            HmsError::Forbidden(detail)
        }
        _ => HmsError::Network(format!("{request} returned {status}")),
    }
}

/// Flattens a DRF-style error body into one message.
///
/// `{"detail": "..."}` yields the detail. Field errors such as
/// `{"name": ["This field is required."]}` yield `name: This field is required.`, joined with
/// `; ` when there are several.
fn describe_error_body(body: &Value) -> Option<String> {
    fn messages(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items.iter().flat_map(messages).collect(),
            Value::Object(map) => map
                .iter()
                .flat_map(|(field, v)| {
                    messages(v)
                        .into_iter()
                        .map(move |m| format!("{field}: {m}"))
                })
                .collect(),
            other => vec![other.to_string()],
        }
    }

    if let Some(detail) = body.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    let all = messages(body);
    if all.is_empty() {
        None
    } else {
        Some(all.join("; "))
    }
}

/// Decodes a reply body, naming the failing field on mismatch.
fn decode<T: DeserializeOwned>(body: &[u8], kind: ResourceKind) -> HmsResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        HmsError::Network(format!("undecodable {kind} response at {path}: {source}"))
    })
}

impl Backend for RestBackend {
    async fn list_filtered<R: Resource>(
        &self,
        auth: &AuthContext,
        filter: &Filter,
    ) -> HmsResult<Vec<R>> {
        let url = self.collection_url(R::KIND)?;
        let mut builder = self.request(Method::GET, url, auth);
        if !filter.is_empty() {
            builder = builder.query(filter.pairs());
        }
        let body = self.send(builder, R::KIND, None).await?;
        decode(&body, R::KIND)
    }

    async fn retrieve<R: Resource>(&self, auth: &AuthContext, id: RecordId) -> HmsResult<R> {
        let url = self.record_url(R::KIND, id)?;
        let body = self
            .send(self.request(Method::GET, url, auth), R::KIND, Some(id))
            .await?;
        decode(&body, R::KIND)
    }

    async fn create<R: Resource>(&self, auth: &AuthContext, draft: &R::Draft) -> HmsResult<R> {
        let url = self.collection_url(R::KIND)?;
        let builder = self.request(Method::POST, url, auth).json(draft);
        let body = self.send(builder, R::KIND, None).await?;
        decode(&body, R::KIND)
    }

    async fn patch<R: Resource>(
        &self,
        auth: &AuthContext,
        id: RecordId,
        fields: &Value,
    ) -> HmsResult<R> {
        if !fields.is_object() {
            return Err(HmsError::Validation("patch body must be a JSON object".into()));
        }
        let url = self.record_url(R::KIND, id)?;
        let builder = self.request(Method::PATCH, url, auth).json(fields);
        let body = self.send(builder, R::KIND, Some(id)).await?;
        decode(&body, R::KIND)
    }

    async fn delete<R: Resource>(&self, auth: &AuthContext, id: RecordId) -> HmsResult<()> {
        let url = self.record_url(R::KIND, id)?;
        self.send(self.request(Method::DELETE, url, auth), R::KIND, Some(id))
            .await?;
        Ok(())
    }
}
