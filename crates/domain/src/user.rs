//! Registered users.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::actor::Role;
use crate::error::{DomainError, check_length};

/// A registered user. Credentials are held by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    pub fn register(name: &str, email: &str, role: Role) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            name: validate_name(name)?,
            email: normalize_email(email)?,
            role,
            address: None,
            phone: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a profile edit. Validation happens before any field changes.
    pub fn apply_update(&mut self, update: ProfileUpdate) -> Result<(), DomainError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let email = update.email.as_deref().map(normalize_email).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    check_length("name", name, 2, 50)
}

/// Lower-cases and sanity-checks an email address.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::Validation {
            field: "email",
            reason: format!("'{email}' is not a valid email address"),
        });
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_normalizes_email() {
        let user = User::register("John Doe", " John@Example.COM ", Role::User).unwrap();
        assert_eq!(user.email, "john@example.com");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_rejects_invalid_email() {
        for email in ["john", "@example.com", "john@", "john@example", "a@b@c.com"] {
            assert!(normalize_email(email).is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn test_rejects_short_name() {
        assert!(User::register("J", "j@example.com", Role::User).is_err());
    }

    #[test]
    fn test_apply_update_validates_first() {
        let mut user = User::register("John Doe", "john@example.com", Role::User).unwrap();
        let result = user.apply_update(ProfileUpdate {
            name: Some("Johnny".to_string()),
            email: Some("broken".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(user.name, "John Doe");

        user.apply_update(ProfileUpdate {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(user.phone.as_deref(), Some("555-0100"));
    }
}
