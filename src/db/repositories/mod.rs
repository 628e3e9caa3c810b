pub mod gig;
pub mod remember;
pub mod user;
