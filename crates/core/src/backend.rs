//! The backend collaborator seam.
//!
//! Persistence and server-side authorisation belong to the backend API. Everything in this crate
//! talks to it through [`Backend`], which the REST client (`hms-client`) and the in-memory
//! store ([`crate::memory::InMemoryBackend`]) both implement.

use crate::auth::AuthContext;
use crate::error::HmsResult;
use crate::models::Resource;
use hms_types::RecordId;
use serde_json::Value;

/// Equality filters on top-level record fields, sent as query parameters.
///
/// Values are compared in their wire form, so `RecordId(5)` matches both `5` and `"5"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pairs: Vec<(String, String)>,
}

impl Filter {
    /// A filter that matches every record.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a `field == value` condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((field.into(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Whether a serialised record satisfies every condition.
    pub fn matches(&self, record: &Value) -> bool {
        self.pairs.iter().all(|(field, wanted)| {
            match record.get(field) {
                Some(Value::String(s)) => s == wanted,
                Some(Value::Number(n)) => n.to_string() == *wanted,
                Some(Value::Bool(b)) => b.to_string() == *wanted,
                _ => false,
            }
        })
    }
}

/// Conventional list/create/retrieve/partial-update/delete operations per resource.
///
/// Every call carries the session's [`AuthContext`]; implementations decide how to present it
/// (a bearer header for REST).
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Lists every record of `R`.
    async fn list<R: Resource>(&self, auth: &AuthContext) -> HmsResult<Vec<R>> {
        self.list_filtered(auth, &Filter::none()).await
    }

    /// Lists records of `R` matching `filter`.
    async fn list_filtered<R: Resource>(
        &self,
        auth: &AuthContext,
        filter: &Filter,
    ) -> HmsResult<Vec<R>>;

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// [`HmsError::NotFound`](crate::HmsError::NotFound) if the id does not resolve.
    async fn retrieve<R: Resource>(&self, auth: &AuthContext, id: RecordId) -> HmsResult<R>;

    /// Creates a record from a draft and returns it as stored.
    async fn create<R: Resource>(&self, auth: &AuthContext, draft: &R::Draft) -> HmsResult<R>;

    /// Applies a partial update. `fields` must be a JSON object.
    async fn patch<R: Resource>(
        &self,
        auth: &AuthContext,
        id: RecordId,
        fields: &Value,
    ) -> HmsResult<R>;

    async fn delete<R: Resource>(&self, auth: &AuthContext, id: RecordId) -> HmsResult<()>;
}
