use anyhow::Result;
use chrono::Utc;
use cookie::CookieJar;
use tower_sessions::Session;

use super::cookies::CookieSigner;
use super::principal::Principal;
use super::tokens::{TokenIssuer, TokenPurpose};
use crate::constants::session::USER_ID_KEY;
use crate::db::Store;

/// Works out who is making a request.
///
/// The server-side session is consulted first. Failing that, a signed
/// `user_id` / `remember_token` cookie pair is checked against the stored
/// remember hashes and, when it matches, the session is re-established.
#[derive(Clone)]
pub struct SessionResolver {
    store: Store,
    signer: CookieSigner,
    issuer: TokenIssuer,
}

impl SessionResolver {
    #[must_use]
    pub const fn new(store: Store, signer: CookieSigner, issuer: TokenIssuer) -> Self {
        Self {
            store,
            signer,
            issuer,
        }
    }

    pub async fn resolve(&self, session: &Session, jar: &CookieJar) -> Result<Principal> {
        if let Some(user_id) = session.get::<i32>(USER_ID_KEY).await? {
            if let Some(user) = self.store.get_user(user_id).await? {
                return Ok(Principal::Authenticated(user));
            }

            tracing::debug!(user_id, "Session refers to a missing user");
            session.remove::<i32>(USER_ID_KEY).await?;
        }

        let Some((user_id, secret)) = self.signer.remember_pair(jar) else {
            return Ok(Principal::Anonymous);
        };

        let Some(user) = self.store.get_user(user_id).await? else {
            return Ok(Principal::Anonymous);
        };

        let records = self.store.remember_records(user_id).await?;
        let valid = self
            .issuer
            .verify_any(TokenPurpose::Remember, &records, &secret, Utc::now())
            .await?;

        if !valid {
            tracing::debug!(user_id, "Remember cookie did not match any stored secret");
            metrics::counter!("auth_remember_restore_total", "outcome" => "rejected").increment(1);
            return Ok(Principal::Anonymous);
        }

        session.insert(USER_ID_KEY, user_id).await?;
        metrics::counter!("auth_remember_restore_total", "outcome" => "restored").increment(1);
        tracing::info!(user_id, "Session restored from remember cookie");

        Ok(Principal::Authenticated(user))
    }
}
