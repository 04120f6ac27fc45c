//! Domain DTOs for the portal API.
//!
//! # Design
//! Server-owned records (`User`, `Feedback`) mirror the backend's response
//! schema. Input structs are the typed boundary callers fill in before an
//! operation runs; each carries a `validate` that rejects missing fields
//! without touching the network. Optional update fields are skipped when
//! `None` so the server only sees what the caller meant to change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}' (expected admin, moderator or user)")),
        }
    }
}

/// A user account as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A stored feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// Body of a successful `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.username) || is_blank(&self.password) {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.username) || is_blank(&self.email) || is_blank(&self.password) {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }
        Ok(())
    }
}

/// Changes to the logged-in user's own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    /// Drops blank fields, then rejects an update with nothing left.
    pub fn normalized(self) -> Result<Self, ApiError> {
        let update = ProfileUpdate {
            email: non_blank(self.email),
            password: non_blank(self.password),
        };
        if update.email.is_none() && update.password.is_none() {
            return Err(ApiError::Validation(
                "At least one field must be updated".to_string(),
            ));
        }
        Ok(update)
    }
}

/// Admin-side changes to an arbitrary user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn normalized(self) -> Result<Self, ApiError> {
        let update = UserUpdate {
            username: non_blank(self.username),
            email: non_blank(self.email),
            password: non_blank(self.password),
            role: self.role,
        };
        if update.username.is_none()
            && update.email.is_none()
            && update.password.is_none()
            && update.role.is_none()
        {
            return Err(ApiError::Validation("No update data provided".to_string()));
        }
        Ok(update)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
}

impl NewFeedback {
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.name) || is_blank(&self.email) || is_blank(&self.message) {
            return Err(ApiError::Validation(
                "Name, email and message are required".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_blank(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_defaults_is_active() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"username":"ann","email":"a@b.c","role":"moderator"}"#)
                .unwrap();
        assert_eq!(user.role, Role::Moderator);
        assert!(user.is_active);
    }

    #[test]
    fn user_rejects_unknown_role() {
        let result: Result<User, _> =
            serde_json::from_str(r#"{"id":1,"username":"ann","email":"a@b.c","role":"root"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn feedback_accepts_null_phone() {
        let fb: Feedback = serde_json::from_str(
            r#"{"id":3,"name":"Bob","email":"b@c.d","phone":null,"message":"hello there"}"#,
        )
        .unwrap();
        assert!(fb.phone.is_none());
    }

    #[test]
    fn role_parses_loosely() {
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn registration_defaults_role_to_user() {
        let reg: Registration =
            serde_json::from_str(r#"{"username":"u","email":"e@x.y","password":"p"}"#).unwrap();
        assert_eq!(reg.role, Role::User);
        let body = serde_json::to_value(&reg).unwrap();
        assert_eq!(body["role"], "user");
    }

    #[test]
    fn credentials_require_both_fields() {
        let creds = Credentials {
            username: "ann".to_string(),
            password: "  ".to_string(),
        };
        assert!(matches!(creds.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn profile_update_drops_blank_fields() {
        let update = ProfileUpdate {
            email: Some("new@x.y".to_string()),
            password: Some(String::new()),
        }
        .normalized()
        .unwrap();
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"email": "new@x.y"}));
    }

    #[test]
    fn empty_updates_are_rejected() {
        assert!(ProfileUpdate::default().normalized().is_err());
        assert!(UserUpdate::default().normalized().is_err());
        let role_only = UserUpdate {
            role: Some(Role::Moderator),
            ..UserUpdate::default()
        };
        assert!(role_only.normalized().is_ok());
    }

    #[test]
    fn feedback_requires_message() {
        let fb = NewFeedback {
            name: "Bob".to_string(),
            email: "b@c.d".to_string(),
            phone: String::new(),
            message: " ".to_string(),
        };
        assert!(fb.validate().is_err());
    }
}
