//! Shared primitive types for the HMS client workspace.
//!
//! These are the small value types every other crate agrees on: validated text, backend record
//! identifiers and the session roles issued by the login flow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated primitive types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input did not name a known role
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// The input was not a valid record identifier
    #[error("invalid record id: {0}")]
    InvalidId(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction. Creation drafts
/// use this for every required text field so that blank form input never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, rejecting input that is blank after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Integer primary key assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TextError::InvalidId(s.to_owned()))
    }
}

/// Role carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Nurse,
    Admin,
    Pharmacist,
    LabTechnician,
    InsuranceProvider,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Patient,
        Role::Doctor,
        Role::Nurse,
        Role::Admin,
        Role::Pharmacist,
        Role::LabTechnician,
        Role::InsuranceProvider,
    ];

    /// Wire name of the role, as found in token claims.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::LabTechnician => "lab_technician",
            Role::InsuranceProvider => "insurance_provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TextError::UnknownRole(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  blood panel ").expect("valid text");
        assert_eq!(text.as_str(), "blood panel");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new(" \t\n"), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"   \"").expect_err("blank rejected");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn role_parses_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!("Lab_Technician".parse::<Role>(), Ok(Role::LabTechnician));
        assert!(matches!(
            "janitor".parse::<Role>(),
            Err(TextError::UnknownRole(_))
        ));
    }

    #[test]
    fn role_serialises_snake_case() {
        let json = serde_json::to_string(&Role::InsuranceProvider).expect("serialise");
        assert_eq!(json, "\"insurance_provider\"");
    }

    #[test]
    fn record_id_is_transparent() {
        let id: RecordId = serde_json::from_str("42").expect("deserialise");
        assert_eq!(id, RecordId::new(42));
        assert_eq!(serde_json::to_string(&id).expect("serialise"), "42");
        assert!("4x".parse::<RecordId>().is_err());
    }
}
