use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::users;
use crate::models::gig::Gig;

/// Closed set of account roles. The numeric ids are what the `users.role_id`
/// column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Musician,
    Employer,
}

impl Role {
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Admin => 1,
            Self::Musician => 2,
            Self::Employer => 3,
        }
    }

    #[must_use]
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Admin),
            2 => Some(Self::Musician),
            3 => Some(Self::Employer),
            _ => None,
        }
    }

    /// Admin accounts are created already activated.
    #[must_use]
    pub const fn activated_on_creation(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Musician => write!(f, "musician"),
            Self::Employer => write!(f, "employer"),
        }
    }
}

/// User data returned from the store (without password or token hashes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub description: String,
    pub location: String,
    pub role: Role,
    pub activated: bool,
    pub created_at: String,
}

impl User {
    #[must_use]
    pub fn is_role(&self, role: Role) -> bool {
        self.role == role
    }

    #[must_use]
    pub const fn is_gig_owner(&self, gig: &Gig) -> bool {
        self.id == gig.employer_id
    }
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let role = Role::from_id(model.role_id).ok_or_else(|| {
            anyhow::anyhow!("User {} has unknown role id {}", model.id, model.role_id)
        })?;

        Ok(Self {
            id: model.id,
            username: model.username,
            email: model.email,
            description: model.description,
            location: model.location,
            role,
            activated: model.activated,
            created_at: model.created_at,
        })
    }
}
