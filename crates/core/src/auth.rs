//! Session identity passed explicitly into every backend call, manager, service and view.
//!
//! Token issuance and verification belong to the external login flow; this type only carries
//! what that flow handed us.

use hms_types::{RecordId, Role};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
    role: Role,
    user_id: RecordId,
}

impl AuthContext {
    /// Creates a context for a signed-in session.
    ///
    /// A blank token is treated as no token at all, so requests go out without an
    /// `Authorization` header rather than with an empty bearer value.
    pub fn new(token: Option<String>, role: Role, user_id: RecordId) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            token,
            role,
            user_id,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_id(&self) -> RecordId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_dropped() {
        let auth = AuthContext::new(Some("   ".into()), Role::Doctor, RecordId::new(3));
        assert_eq!(auth.bearer_token(), None);
    }

    #[test]
    fn debug_output_redacts_token() {
        let auth = AuthContext::new(Some("secret-jwt".into()), Role::Patient, RecordId::new(1));
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret-jwt"));
        assert!(rendered.contains("<redacted>"));
        assert_eq!(auth.bearer_token(), Some("secret-jwt"));
    }

    #[test]
    fn admin_flag_follows_role() {
        assert!(AuthContext::new(None, Role::Admin, RecordId::new(1)).is_admin());
        assert!(!AuthContext::new(None, Role::Nurse, RecordId::new(1)).is_admin());
    }
}
