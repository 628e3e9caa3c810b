//! Identity, credentials and access control.

pub mod cookies;
pub mod guards;
pub mod password;
pub mod principal;
pub mod resolver;
pub mod tokens;

pub use cookies::{CookieSigner, jar_from_headers};
pub use guards::{
    Activated, Authenticated, Decision, GigOwner, Guard, Guards, RedirectTarget, Rejection,
    RoleRequired,
};
pub use password::SecretHasher;
pub use principal::Principal;
pub use resolver::SessionResolver;
pub use tokens::{IssuedToken, TokenIssuer, TokenPurpose, TokenRecord};
