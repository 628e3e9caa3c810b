pub mod field_errors;
pub mod gig;
pub mod user;

pub use field_errors::FieldErrors;
pub use gig::{Gig, GigInput};
pub use user::{Role, User};
