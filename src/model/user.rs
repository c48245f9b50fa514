use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a user. Exactly one admin is kept alive by `ensure_admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse_role(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Display name; also the target of `@mention` resolution
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a user. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        User {
            id: super::new_id(),
            name: name.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }

    /// Apply a patch. Empty strings are ignored, matching the form behaviour
    /// where a blank field means "keep the current value".
    pub fn update(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name.filter(|n| !n.trim().is_empty()) {
            self.name = name;
        }
        if let Some(email) = patch.email.filter(|e| !e.trim().is_empty()) {
            self.email = email;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_ignores_blank_fields() {
        let mut user = User::new("Alice", "alice@example.com", Role::User);
        user.update(UserPatch {
            name: Some("  ".into()),
            email: Some("a@example.org".into()),
            role: Some(Role::Admin),
        });
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "a@example.org");
        assert!(user.is_admin());
    }

    #[test]
    fn serializes_camel_case() {
        let user = User::new("Bob", "bob@example.com", Role::User);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn role_defaults_when_missing() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","name":"Carol","email":"c@x","createdAt":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::User);
    }
}
