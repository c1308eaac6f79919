use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A stored account. `password_hash` is a PHC string and never leaves the
/// server; use [`UserProfile`] or [`UserSummary`] for anything serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(name: String, email: &str, password_hash: String) -> anyhow::Result<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            anyhow::bail!("name empty");
        }
        let email = normalize_email(email);
        if !email.contains('@') {
            anyhow::bail!("invalid email");
        }
        if password_hash.is_empty() {
            anyhow::bail!("password hash empty");
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_admin: false,
            addresses: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn add_address(&mut self, address: Address) {
        self.addresses.push(address);
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            is_admin: u.is_admin,
            addresses: u.addresses.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Owner details attached to admin order listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email_and_defaults_to_customer() {
        let user = User::new(" Alice ".into(), "  Alice@Example.COM ", "$argon2id$x".into()).unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_admin);
        assert!(user.addresses.is_empty());
    }

    #[test]
    fn validation_errors() {
        assert!(User::new("".into(), "a@b.com", "h".into()).is_err());
        assert!(User::new("Bob".into(), "invalid", "h".into()).is_err());
        assert!(User::new("Bob".into(), "b@c.com", "".into()).is_err());
    }

    #[test]
    fn profile_never_carries_the_hash() {
        let user = User::new("Carol".into(), "c@d.com", "$argon2id$secret".into()).unwrap();
        let json = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"isAdmin\":false"));
    }

    #[test]
    fn add_address_appends_in_order() {
        let mut user = User::new("Dan".into(), "d@e.com", "h".into()).unwrap();
        let first = Address {
            street: "1 Main".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
        };
        let mut second = first.clone();
        second.street = "2 Side".into();
        user.add_address(first.clone());
        user.add_address(second.clone());
        assert_eq!(user.addresses, vec![first, second]);
    }
}
