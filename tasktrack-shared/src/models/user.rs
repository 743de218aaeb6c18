/// User model
///
/// A user is created on registration and is afterwards only mutated one field
/// at a time (name, email, password) by the owning user. Users are never
/// deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A registered user
///
/// Equality and hashing are by `id`: two snapshots of the same persisted user
/// compare equal even if one of them carries a stale name or email.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user identifier
    pub id: i64,

    /// Display name
    pub name: String,

    /// Email address (unique, used as the login and token subject)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> User {
        let now = Utc::now();
        User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_equality_is_by_id() {
        let a = user(1, "alice");
        let mut renamed = a.clone();
        renamed.name = "Alice Liddell".to_string();

        assert_eq!(a, renamed);
        assert_ne!(a, user(2, "alice"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(1, "alice")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }
}
