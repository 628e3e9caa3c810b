use serde::{Deserialize, Serialize};

use crate::models::{FieldErrors, Gig, Role, User};
use crate::services::{GigDetails, HomeFeed, Profile};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
            redirect: None,
        }
    }

    pub fn field_errors(fields: FieldErrors) -> Self {
        Self {
            fields: Some(fields),
            ..Self::error("Validation failed")
        }
    }

    pub fn redirect(location: &str, notice: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: notice,
            fields: None,
            redirect: Some(location.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    /// Only included when the user is looking at their own account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub location: String,
    pub description: String,
    pub activated: bool,
    pub created_at: String,
}

impl UserDto {
    #[must_use]
    pub fn public(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: None,
            role: user.role,
            location: user.location.clone(),
            description: user.description.clone(),
            activated: user.activated,
            created_at: user.created_at.clone(),
        }
    }

    #[must_use]
    pub fn private(user: &User) -> Self {
        Self {
            email: Some(user.email.clone()),
            ..Self::public(user)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserDto {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub payment: Option<f64>,
    pub location: String,
    pub employer_id: i32,
    pub created_at: String,
}

impl From<&Gig> for GigDto {
    fn from(gig: &Gig) -> Self {
        Self {
            id: gig.id,
            slug: gig.slug.clone(),
            title: gig.title.clone(),
            description: gig.description.clone(),
            payment: gig.payment,
            location: gig.location.clone(),
            employer_id: gig.employer_id,
            created_at: gig.created_at.clone(),
        }
    }
}

pub fn gig_dtos(gigs: &[Gig]) -> Vec<GigDto> {
    gigs.iter().map(GigDto::from).collect()
}

pub fn user_dtos(users: &[User]) -> Vec<UserDto> {
    users.iter().map(UserDto::public).collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GigDetailsDto {
    pub gig: GigDto,
    pub applicants: Vec<UserDto>,
    /// Whether the requesting musician applied; absent for other roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
}

impl GigDetailsDto {
    pub fn new(details: &GigDetails, applied: Option<bool>) -> Self {
        Self {
            gig: GigDto::from(&details.gig),
            applicants: user_dtos(&details.applicants),
            applied,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationDto {
    pub gig: GigDto,
    pub applied: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileDto {
    pub user: UserDto,
    pub gigs: Vec<GigDto>,
}

impl ProfileDto {
    pub fn new(profile: &Profile, own: bool) -> Self {
        let user = if own {
            UserDto::private(&profile.user)
        } else {
            UserDto::public(&profile.user)
        };

        Self {
            user,
            gigs: gig_dtos(&profile.gigs),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gigs: Option<Vec<GigDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicians: Option<Vec<UserDto>>,
}

impl From<&HomeFeed> for HomeDto {
    fn from(feed: &HomeFeed) -> Self {
        Self {
            gigs: feed.gigs.as_deref().map(gig_dtos),
            musicians: feed.musicians.as_deref().map(user_dtos),
        }
    }
}
