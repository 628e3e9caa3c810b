//! Composable access checks run before a handler body.
//!
//! Each guard either allows the request or denies it with a redirect target
//! and a notice for the user. A denial is an ordinary outcome; only store
//! failures surface as errors.

use anyhow::Result;
use async_trait::async_trait;

use super::principal::Principal;
use crate::constants::routes;
use crate::db::Store;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Login,
    Home,
}

impl RedirectTarget {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => routes::LOGIN,
            Self::Home => routes::HOME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub target: RedirectTarget,
    pub notice: String,
}

impl Rejection {
    pub fn new(target: RedirectTarget, notice: impl Into<String>) -> Self {
        Self {
            target,
            notice: notice.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Rejection),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, principal: &Principal) -> Result<Decision>;
}

pub struct Authenticated;

#[async_trait]
impl Guard for Authenticated {
    async fn check(&self, principal: &Principal) -> Result<Decision> {
        if principal.is_authenticated() {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Rejection::new(
            RedirectTarget::Login,
            "You need to be logged in to access this page",
        )))
    }
}

pub struct Activated;

#[async_trait]
impl Guard for Activated {
    async fn check(&self, principal: &Principal) -> Result<Decision> {
        if principal.is_activated() {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Rejection::new(
            RedirectTarget::Home,
            "Only activated users have access to this page",
        )))
    }
}

pub struct RoleRequired(pub Role);

#[async_trait]
impl Guard for RoleRequired {
    async fn check(&self, principal: &Principal) -> Result<Decision> {
        if principal.is_role(self.0) {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Rejection::new(
            RedirectTarget::Home,
            "You are not authorized to access this page",
        )))
    }
}

/// Passes only when the gig identified by `slug` belongs to the principal.
/// A missing gig is denied the same way as someone else's.
pub struct GigOwner {
    store: Store,
    slug: String,
}

impl GigOwner {
    pub fn new(store: Store, slug: impl Into<String>) -> Self {
        Self {
            store,
            slug: slug.into(),
        }
    }
}

#[async_trait]
impl Guard for GigOwner {
    async fn check(&self, principal: &Principal) -> Result<Decision> {
        let gig = self.store.get_gig_by_slug(&self.slug).await?;

        if gig.is_some_and(|gig| principal.owns(&gig)) {
            return Ok(Decision::Allow);
        }
        Ok(Decision::Deny(Rejection::new(
            RedirectTarget::Home,
            "You are not the owner of that gig.",
        )))
    }
}

/// Ordered guard chain; the first denial wins and later guards are skipped.
#[derive(Default)]
pub struct Guards {
    chain: Vec<Box<dyn Guard>>,
}

impl Guards {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated() -> Self {
        Self::new().with(Authenticated)
    }

    /// Logged in and activated, the common case for member-only pages.
    #[must_use]
    pub fn member() -> Self {
        Self::authenticated().with(Activated)
    }

    #[must_use]
    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.chain.push(Box::new(guard));
        self
    }

    pub async fn check(&self, principal: &Principal) -> Result<Decision> {
        for guard in &self.chain {
            let decision = guard.check(principal).await?;
            if !decision.is_allowed() {
                return Ok(decision);
            }
        }
        Ok(Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn principal(role: Role, activated: bool) -> Principal {
        Principal::Authenticated(User {
            id: 1,
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            description: String::new(),
            location: "Lisbon".to_string(),
            role,
            activated,
            created_at: String::new(),
        })
    }

    fn denied_to(decision: &Decision) -> Option<RedirectTarget> {
        match decision {
            Decision::Allow => None,
            Decision::Deny(rejection) => Some(rejection.target),
        }
    }

    #[tokio::test]
    async fn test_authenticated_redirects_anonymous_to_login() {
        let decision = Authenticated.check(&Principal::Anonymous).await.unwrap();
        assert_eq!(denied_to(&decision), Some(RedirectTarget::Login));

        let decision = Authenticated
            .check(&principal(Role::Musician, false))
            .await
            .unwrap();
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_role_required_ignores_activation() {
        let guard = RoleRequired(Role::Employer);

        for activated in [true, false] {
            let employer = guard
                .check(&principal(Role::Employer, activated))
                .await
                .unwrap();
            assert!(employer.is_allowed());

            let musician = guard
                .check(&principal(Role::Musician, activated))
                .await
                .unwrap();
            assert_eq!(denied_to(&musician), Some(RedirectTarget::Home));
        }
    }

    #[tokio::test]
    async fn test_activated_rejects_every_unactivated_role() {
        for role in [Role::Admin, Role::Musician, Role::Employer] {
            let decision = Activated.check(&principal(role, false)).await.unwrap();
            assert_eq!(denied_to(&decision), Some(RedirectTarget::Home));

            let decision = Activated.check(&principal(role, true)).await.unwrap();
            assert!(decision.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_chain_short_circuits_on_first_denial() {
        let guards = Guards::member().with(RoleRequired(Role::Employer));

        let Decision::Deny(rejection) = guards.check(&Principal::Anonymous).await.unwrap() else {
            panic!("anonymous principal should be denied");
        };
        assert_eq!(rejection.target, RedirectTarget::Login);
        assert_eq!(
            rejection.notice,
            "You need to be logged in to access this page"
        );

        let Decision::Deny(rejection) = guards
            .check(&principal(Role::Musician, false))
            .await
            .unwrap()
        else {
            panic!("unactivated musician should be denied");
        };
        assert_eq!(
            rejection.notice,
            "Only activated users have access to this page"
        );

        let decision = guards.check(&principal(Role::Employer, true)).await.unwrap();
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_empty_chain_allows() {
        let decision = Guards::new().check(&Principal::Anonymous).await.unwrap();
        assert!(decision.is_allowed());
    }
}
