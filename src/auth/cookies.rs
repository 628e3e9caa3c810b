//! Signed remember-me cookies.
//!
//! Values are signed, not encrypted: a client can read them but any change is
//! detected. The signing key is derived from the server secret together with
//! a fixed context label so it is distinct from keys used for anything else.

use anyhow::Result;
use axum::http::{HeaderMap, header};
use cookie::{Cookie, CookieJar, Key, SameSite};

use crate::config::MIN_SECRET_KEY_LEN;
use crate::constants::cookies::{
    PATH, REMEMBER_MAX_AGE_DAYS, REMEMBER_TOKEN, SIGNING_CONTEXT, USER_ID,
};

#[derive(Clone)]
pub struct CookieSigner {
    key: Key,
    secure: bool,
}

impl CookieSigner {
    pub fn new(secret: &str, secure: bool) -> Result<Self> {
        if secret.len() < MIN_SECRET_KEY_LEN {
            anyhow::bail!("Cookie secret must be at least {MIN_SECRET_KEY_LEN} bytes");
        }

        let mut material = Vec::with_capacity(secret.len() + 1 + SIGNING_CONTEXT.len());
        material.extend_from_slice(secret.as_bytes());
        material.push(0);
        material.extend_from_slice(SIGNING_CONTEXT.as_bytes());

        Ok(Self {
            key: Key::derive_from(&material),
            secure,
        })
    }

    /// Set-cookie and clear-cookie both go through here so that the
    /// attributes always match.
    fn base_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(PATH)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(REMEMBER_MAX_AGE_DAYS))
            .build()
    }

    #[must_use]
    pub fn signed_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(self.base_cookie(name, value));

        jar.get(name)
            .cloned()
            .unwrap_or_else(|| self.removal_cookie(name))
    }

    #[must_use]
    pub fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.base_cookie(name, String::new());
        cookie.make_removal();
        cookie
    }

    /// The `user_id` / `remember_token` pair set when "remember me" is chosen.
    #[must_use]
    pub fn remember_cookies(&self, user_id: i32, secret: &str) -> [Cookie<'static>; 2] {
        [
            self.signed_cookie(USER_ID, user_id.to_string()),
            self.signed_cookie(REMEMBER_TOKEN, secret.to_string()),
        ]
    }

    #[must_use]
    pub fn forget_cookies(&self) -> [Cookie<'static>; 2] {
        [
            self.removal_cookie(USER_ID),
            self.removal_cookie(REMEMBER_TOKEN),
        ]
    }

    /// Returns the value of `name` if present and its signature checks out.
    /// A tampered cookie is indistinguishable from a missing one.
    #[must_use]
    pub fn verified_value(&self, jar: &CookieJar, name: &str) -> Option<String> {
        jar.signed(&self.key)
            .get(name)
            .map(|c| c.value().to_string())
    }

    /// Reads the verified remember-me pair from the request cookies.
    #[must_use]
    pub fn remember_pair(&self, jar: &CookieJar) -> Option<(i32, String)> {
        let user_id = self.verified_value(jar, USER_ID)?.parse().ok()?;
        let token = self.verified_value(jar, REMEMBER_TOKEN)?;
        Some((user_id, token))
    }
}

/// Collects every cookie sent with a request.
#[must_use]
pub fn jar_from_headers(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();

    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(raw).flatten() {
            jar.add_original(cookie.into_owned());
        }
    }

    jar
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn signer() -> CookieSigner {
        CookieSigner::new("an-adequately-long-test-secret-value", false).unwrap()
    }

    fn request_jar(cookies: &[Cookie<'static>]) -> CookieJar {
        let header_value = cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&header_value).unwrap());
        jar_from_headers(&headers)
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(CookieSigner::new("short", true).is_err());
    }

    #[test]
    fn test_signed_pair_round_trips() {
        let signer = signer();
        let cookies = signer.remember_cookies(42, "abc123");

        assert_ne!(cookies[0].value(), "42");
        assert_eq!(
            signer.remember_pair(&request_jar(&cookies)),
            Some((42, "abc123".to_string()))
        );
    }

    #[test]
    fn test_tampered_value_is_treated_as_missing() {
        let signer = signer();
        let [user_id, token] = signer.remember_cookies(42, "abc123");

        let mut tampered = user_id.value().to_string();
        tampered.pop();
        tampered.push('3');
        let forged = Cookie::new(USER_ID, tampered);

        let jar = request_jar(&[forged, token]);
        assert_eq!(signer.verified_value(&jar, USER_ID), None);
        assert_eq!(signer.remember_pair(&jar), None);
    }

    #[test]
    fn test_other_secret_cannot_verify() {
        let cookies = signer().remember_cookies(42, "abc123");
        let other = CookieSigner::new("a-completely-different-secret-value!", false).unwrap();
        assert_eq!(other.remember_pair(&request_jar(&cookies)), None);
    }

    #[test]
    fn test_removal_matches_set_attributes() {
        let signer = signer();
        let set = signer.signed_cookie(USER_ID, "1".to_string());
        let clear = signer.removal_cookie(USER_ID);

        assert_eq!(set.path(), clear.path());
        assert_eq!(set.domain(), clear.domain());
        assert_eq!(set.secure(), clear.secure());
        assert_eq!(set.http_only(), clear.http_only());
        assert_eq!(set.same_site(), clear.same_site());
        assert_eq!(clear.max_age(), Some(time::Duration::ZERO));
        assert_eq!(clear.value(), "");
        assert_eq!(
            set.max_age(),
            Some(time::Duration::days(REMEMBER_MAX_AGE_DAYS))
        );
    }

    #[test]
    fn test_unsigned_cookie_is_ignored() {
        let signer = signer();
        let jar = request_jar(&[Cookie::new(USER_ID, "1"), Cookie::new(REMEMBER_TOKEN, "x")]);
        assert_eq!(signer.remember_pair(&jar), None);
    }
}
