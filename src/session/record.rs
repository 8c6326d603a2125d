use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::backend::Credentials;
use crate::clock::from_epoch_ms;
use crate::types::{ApiId, PhoneNumber, UserId};

/// Authenticated credential bundle, persisted as one record.
///
/// Serialized with camelCase keys (`phoneNumber`, `accessToken`, ...), the
/// layout the web front end keeps in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub phone_number: PhoneNumber,
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    pub api_id: ApiId,
    pub api_hash: String,
    pub is_authenticated: bool,
    /// Absolute expiry of `access_token`, epoch milliseconds.
    pub expires_at: i64,
    pub access_token: String,
    pub token_type: String,
}

impl SessionData {
    /// Assemble the session issued at the end of the wizard.
    #[must_use]
    pub fn from_credentials(phone_number: PhoneNumber, credentials: Credentials) -> Self {
        Self {
            phone_number,
            user_id: credentials.user_id,
            username: credentials.username,
            api_id: credentials.api_id,
            api_hash: credentials.api_hash,
            is_authenticated: true,
            expires_at: credentials.expires_at,
            access_token: credentials.access_token,
            token_type: credentials.token_type,
        }
    }

    /// Token expiry as a timestamp.
    #[must_use]
    pub fn expires_at_time(&self) -> OffsetDateTime {
        from_epoch_ms(self.expires_at)
    }

    /// `true` once `now_ms` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    /// Value for the `Authorization` header of authenticated calls.
    ///
    /// The backend reports `token_type` in lowercase (`"bearer"`); the scheme
    /// is normalised to `Bearer` in that case.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let scheme = if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{scheme} {}", self.access_token)
    }

    /// Reason this record must not be persisted or trusted at `now_ms`, if any.
    /// Checked by both `SessionStore::save` and `SessionStore::load`.
    pub(crate) fn invalid_reason(&self, now_ms: i64) -> Option<&'static str> {
        if !self.is_authenticated {
            Some("session is not authenticated")
        } else if self.access_token.is_empty() {
            Some("access token is empty")
        } else if self.is_expired_at(now_ms) {
            Some("expiry is not in the future")
        } else {
            None
        }
    }
}
