pub mod prelude;

pub mod applications;
pub mod gigs;
pub mod remember_tokens;
pub mod users;
