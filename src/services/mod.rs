pub mod notifications;
pub use notifications::{
    LogSink, Mailer, MemoryOutbox, Notification, NotificationSink, SmtpSink, sink_from_config,
};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginOutcome, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod gig_service;
pub mod gig_service_impl;
pub use gig_service::{GigDetails, GigError, GigService};
pub use gig_service_impl::SeaOrmGigService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, HomeFeed, Profile};
pub use account_service_impl::SeaOrmAccountService;
