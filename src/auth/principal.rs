use crate::models::{Gig, Role, User};

/// Identity attached to a request: either nobody or a stored user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Principal {
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<i32> {
        self.user().map(|u| u.id)
    }

    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.user().is_some_and(|u| u.activated)
    }

    #[must_use]
    pub fn is_role(&self, role: Role) -> bool {
        self.user().is_some_and(|u| u.is_role(role))
    }

    #[must_use]
    pub fn owns(&self, gig: &Gig) -> bool {
        self.user().is_some_and(|u| u.is_gig_owner(gig))
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self::Authenticated(user)
    }
}
