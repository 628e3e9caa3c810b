pub mod tokens {

    /// Activation links stay valid for two days.
    pub const ACTIVATION_MAX_AGE_SECS: i64 = 2 * 24 * 60 * 60;

    /// Password reset links stay valid for thirty minutes.
    pub const RESET_MAX_AGE_SECS: i64 = 30 * 60;

    pub const SECRET_BYTES: usize = 32;

    /// Remembered devices kept per user; the oldest are dropped beyond this.
    pub const MAX_REMEMBER_DEVICES: usize = 5;
}

pub mod cookies {

    pub const REMEMBER_TOKEN: &str = "remember_token";

    pub const USER_ID: &str = "user_id";

    pub const REMEMBER_MAX_AGE_DAYS: i64 = 100;

    /// Context label mixed into the signing key for remember-me cookies.
    pub const SIGNING_CONTEXT: &str = "cookie";

    pub const PATH: &str = "/";
}

pub mod session {

    pub const USER_ID_KEY: &str = "user_id";

    pub const FLASHES_KEY: &str = "_flashes";
}

pub mod gigs {

    /// Random bytes appended (hex encoded) to every gig slug.
    pub const SLUG_SUFFIX_BYTES: usize = 3;

    pub const SLUG_ATTEMPTS: usize = 5;
}

pub mod mail {

    pub const CONFIRM_TEMPLATE: &str = "emails/auth/confirm";

    pub const PASSWORD_RESET_TEMPLATE: &str = "emails/auth/password_reset";
}

pub mod routes {

    pub const HOME: &str = "/api/home";

    pub const LOGIN: &str = "/api/auth/login";
}
