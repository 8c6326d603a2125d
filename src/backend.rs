//! Remote-call seams.
//!
//! The crate never talks HTTP itself. The application implements
//! [`AuthBackend`] and [`UsageSource`] over its own transport and hands the
//! implementations to [`AuthFlow`](crate::wizard::AuthFlow) and
//! [`fetch_gating`](crate::usage::fetch_gating).

use std::future::Future;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::types::{ApiId, PhoneNumber, UserId};
use crate::usage::{PlanInfo, UsageSnapshot};

/// Typed failure of an opaque remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RemoteError {
    /// Backend declined the request (invalid phone, wrong or expired code).
    #[error("{0}")]
    Rejected(String),

    /// Backend throttled the request.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Transport-level failure. Retryable.
    #[error("network failure: {0}")]
    Network(String),
}

/// Answer to `sendPhone`: the code was dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PhoneAccepted {
    /// Seconds before another code may be requested. `None` leaves the
    /// configured resend cooldown in force.
    #[serde(default)]
    pub cooldown_seconds: Option<u64>,
}

impl PhoneAccepted {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }
}

/// Full credential bundle issued after a successful code or 2FA check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    pub api_id: ApiId,
    pub api_hash: String,
    pub access_token: String,
    pub token_type: String,
    /// Absolute token expiry, epoch milliseconds.
    pub expires_at: i64,
}

/// Answer to `sendCode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// The account has a cloud password; the wizard must ask for it.
    TwoFactorRequired,
    /// Signed in.
    Authenticated(Credentials),
}

/// Consumer-provided login backend.
///
/// # Example
///
/// ```rust,ignore
/// impl AuthBackend for HttpBackend {
///     async fn send_phone(&self, phone: &PhoneNumber) -> Result<PhoneAccepted, RemoteError> {
///         self.post("/send_code", json!({ "phone_number": phone })).await
///     }
///     // ...
/// }
/// ```
pub trait AuthBackend: Send + Sync {
    /// Ask the backend to send a verification code. Also used for resends.
    fn send_phone(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<PhoneAccepted, RemoteError>> + Send;

    /// Submit the verification code.
    fn send_code(
        &self,
        phone: &PhoneNumber,
        code: &str,
    ) -> impl Future<Output = Result<CodeOutcome, RemoteError>> + Send;

    /// Submit the two-factor password.
    fn send_2fa(
        &self,
        phone: &PhoneNumber,
        password: &SecretString,
    ) -> impl Future<Output = Result<Credentials, RemoteError>> + Send;
}

/// Consumer-provided usage/plan backend.
pub trait UsageSource: Send + Sync {
    /// Fetch the current usage snapshot for a user.
    fn usage_stats(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<UsageSnapshot, RemoteError>> + Send;

    /// Fetch the plan catalog.
    fn plans(&self) -> impl Future<Output = Result<Vec<PlanInfo>, RemoteError>> + Send;
}
