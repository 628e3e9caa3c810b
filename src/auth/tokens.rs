//! Single-use secrets for account activation, password reset and remember-me.
//!
//! Only an Argon2id hash of each secret is persisted, next to the time it was
//! issued. The plaintext is handed back once, to be mailed or set as a cookie.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fmt::{self, Write};

use super::password::SecretHasher;
use crate::constants::tokens::{ACTIVATION_MAX_AGE_SECS, RESET_MAX_AGE_SECS, SECRET_BYTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Activation,
    Reset,
    Remember,
}

impl TokenPurpose {
    /// How long a secret stays valid after issuance. `None` means it is only
    /// revoked explicitly.
    #[must_use]
    pub fn max_age(self) -> Option<Duration> {
        match self {
            Self::Activation => Some(Duration::seconds(ACTIVATION_MAX_AGE_SECS)),
            Self::Reset => Some(Duration::seconds(RESET_MAX_AGE_SECS)),
            Self::Remember => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Reset => "reset",
            Self::Remember => "remember",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored half of a secret: its hash and when it was issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub hash: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    #[must_use]
    pub fn new(hash: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            hash: Some(hash),
            issued_at: Some(issued_at),
        }
    }

    /// Builds a record from the string columns the store keeps.
    /// An unparseable timestamp is treated as missing.
    #[must_use]
    pub fn from_columns(hash: Option<String>, issued_at: Option<&str>) -> Self {
        let issued_at = issued_at
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));

        Self { hash, issued_at }
    }

    #[must_use]
    pub fn has_hash(&self) -> bool {
        self.hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    #[must_use]
    pub fn issued_at_rfc3339(&self) -> Option<String> {
        self.issued_at.map(|t| t.to_rfc3339())
    }
}

/// A freshly issued secret. `secret` is the only copy of the plaintext.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub secret: String,
    pub record: TokenRecord,
}

/// Generate a random URL-safe secret (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SECRET_BYTES] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(SECRET_BYTES * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// `true` once `now - issued_at` reaches the purpose's max age. Secrets with
/// a bounded lifetime but no issuance time count as expired.
#[must_use]
pub fn is_expired(purpose: TokenPurpose, issued_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(max_age) = purpose.max_age() else {
        return false;
    };

    issued_at.is_none_or(|issued_at| now - issued_at >= max_age)
}

#[derive(Clone)]
pub struct TokenIssuer {
    hasher: SecretHasher,
}

impl TokenIssuer {
    #[must_use]
    pub const fn new(hasher: SecretHasher) -> Self {
        Self { hasher }
    }

    /// Generates a new secret for `purpose`. The caller persists the returned
    /// record over any previous one, which invalidates the old secret.
    pub async fn issue(&self, purpose: TokenPurpose, now: DateTime<Utc>) -> Result<IssuedToken> {
        let secret = generate_token();
        let hash = self.hasher.hash_blocking(secret.clone()).await?;

        tracing::debug!(purpose = %purpose, "Issued token");

        Ok(IssuedToken {
            secret,
            record: TokenRecord::new(hash, now),
        })
    }

    /// Checks `candidate` against `record`. Never mutates anything; callers
    /// that consume the secret clear the stored hash themselves.
    pub async fn verify(
        &self,
        purpose: TokenPurpose,
        record: &TokenRecord,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if candidate.is_empty() || !record.has_hash() {
            return Ok(false);
        }

        if is_expired(purpose, record.issued_at, now) {
            tracing::debug!(purpose = %purpose, "Token expired");
            return Ok(false);
        }

        let hash = record.hash.clone().unwrap_or_default();
        SecretHasher::verify_blocking(candidate.to_string(), hash).await
    }

    /// Verifies `candidate` against any of several records, as with one
    /// remember-me secret per device.
    pub async fn verify_any(
        &self,
        purpose: TokenPurpose,
        records: &[TokenRecord],
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        for record in records {
            if self.verify(purpose, record, candidate, now).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::cheap_hasher;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(cheap_hasher())
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), SECRET_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_expiry_boundaries() {
        let issued = Utc::now();

        let just_inside = issued + Duration::seconds(ACTIVATION_MAX_AGE_SECS - 1);
        let boundary = issued + Duration::seconds(ACTIVATION_MAX_AGE_SECS);
        assert!(!is_expired(TokenPurpose::Activation, Some(issued), just_inside));
        assert!(is_expired(TokenPurpose::Activation, Some(issued), boundary));

        let just_inside = issued + Duration::minutes(29);
        let boundary = issued + Duration::minutes(30);
        assert!(!is_expired(TokenPurpose::Reset, Some(issued), just_inside));
        assert!(is_expired(TokenPurpose::Reset, Some(issued), boundary));

        let years_later = issued + Duration::days(3650);
        assert!(!is_expired(TokenPurpose::Remember, Some(issued), years_later));
        assert!(!is_expired(TokenPurpose::Remember, None, years_later));
        assert!(is_expired(TokenPurpose::Reset, None, issued));
    }

    #[test]
    fn test_record_from_columns() {
        let now = Utc::now();
        let record = TokenRecord::from_columns(Some("h".to_string()), Some(&now.to_rfc3339()));
        assert_eq!(record.issued_at, Some(now));
        assert!(record.has_hash());

        let record = TokenRecord::from_columns(Some(String::new()), Some("yesterday"));
        assert_eq!(record.issued_at, None);
        assert!(!record.has_hash());
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer.issue(TokenPurpose::Activation, now).await.unwrap();

        assert!(
            issuer
                .verify(TokenPurpose::Activation, &issued.record, &issued.secret, now)
                .await
                .unwrap()
        );
        assert!(
            !issuer
                .verify(TokenPurpose::Activation, &issued.record, "wrong", now)
                .await
                .unwrap()
        );
        assert!(
            !issuer
                .verify(TokenPurpose::Activation, &issued.record, "", now)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_secret() {
        let issuer = issuer();
        let now = Utc::now();
        let first = issuer.issue(TokenPurpose::Reset, now).await.unwrap();
        let second = issuer.issue(TokenPurpose::Reset, now).await.unwrap();

        // The store keeps only the latest record.
        let stored = second.record;
        assert!(
            !issuer
                .verify(TokenPurpose::Reset, &stored, &first.secret, now)
                .await
                .unwrap()
        );
        assert!(
            issuer
                .verify(TokenPurpose::Reset, &stored, &second.secret, now)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_matching_secret_rejected_after_max_age() {
        let issuer = issuer();
        let issued_at = Utc::now();
        let token = issuer.issue(TokenPurpose::Reset, issued_at).await.unwrap();

        let later = issued_at + Duration::minutes(30);
        assert!(
            !issuer
                .verify(TokenPurpose::Reset, &token.record, &token.secret, later)
                .await
                .unwrap()
        );

        let token = issuer.issue(TokenPurpose::Activation, issued_at).await.unwrap();
        let later = issued_at + Duration::days(2);
        assert!(
            !issuer
                .verify(TokenPurpose::Activation, &token.record, &token.secret, later)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_cleared_record_never_verifies() {
        let issuer = issuer();
        let record = TokenRecord {
            hash: Some(String::new()),
            issued_at: Some(Utc::now()),
        };
        assert!(
            !issuer
                .verify(TokenPurpose::Activation, &record, "anything", Utc::now())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_verify_any_matches_one_of_many() {
        let issuer = issuer();
        let now = Utc::now();
        let laptop = issuer.issue(TokenPurpose::Remember, now).await.unwrap();
        let phone = issuer.issue(TokenPurpose::Remember, now).await.unwrap();
        let records = vec![laptop.record.clone(), phone.record.clone()];

        assert!(
            issuer
                .verify_any(TokenPurpose::Remember, &records, &phone.secret, now)
                .await
                .unwrap()
        );
        assert!(
            !issuer
                .verify_any(TokenPurpose::Remember, &[], &phone.secret, now)
                .await
                .unwrap()
        );
    }
}
