pub use super::applications::Entity as Applications;
pub use super::gigs::Entity as Gigs;
pub use super::remember_tokens::Entity as RememberTokens;
pub use super::users::Entity as Users;
