//! The acting identity handed to every protected operation.

use std::str::FromStr;

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Authorization role supplied by the identity provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::invalid(
                "role",
                format!("unknown role '{other}'"),
            )),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns true if the actor owns the resource.
    pub fn owns(&self, owner: UserId) -> bool {
        self.user_id == owner
    }

    /// Fails with `Forbidden` unless the actor is an administrator.
    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            return Ok(());
        }
        Err(DomainError::Forbidden("admin role required".to_string()))
    }

    /// Returns true if the actor owns the resource or is an administrator.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.owns(owner) || self.is_admin()
    }
}
