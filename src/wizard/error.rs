use std::time::Duration;

use super::state::AuthStep;
use crate::backend::RemoteError;
use crate::session::SessionError;

/// Login wizard errors.
///
/// Every failed transition leaves the wizard in a well-defined step; the
/// caller gets either the new step or one of these to display.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Rejected before any remote call. No state change.
    #[error("{0}")]
    InvalidInput(String),

    /// Backend declined (wrong code, expired code, invalid phone).
    #[error("{0}")]
    RemoteRejected(String),

    /// Resend cooldown or attempt ceiling hit, or the backend throttled us.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Transport failure or timeout. Retry the same transition.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Transition invoked from a step that does not accept it.
    #[error("Cannot {action} at the {actual} step")]
    InvalidStep {
        action: &'static str,
        actual: AuthStep,
    },

    /// A remote call for this wizard is still in flight.
    #[error("A request is already in progress")]
    Busy,

    /// The result belongs to a call this wizard no longer waits for.
    #[error("Response belongs to an abandoned request")]
    StaleResponse,

    /// The session store refused the issued session.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// `true` if re-invoking the same transition may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkFailure(_) | Self::Busy | Self::RateLimited { .. }
        )
    }
}

impl From<RemoteError> for AuthError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Rejected(message) => Self::RemoteRejected(message),
            RemoteError::RateLimited {
                message,
                retry_after_secs,
            } => Self::RateLimited {
                message,
                retry_after: retry_after_secs.map(Duration::from_secs),
            },
            RemoteError::Network(message) => Self::NetworkFailure(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_map_onto_taxonomy() {
        assert!(matches!(
            AuthError::from(RemoteError::Rejected("bad code".into())),
            AuthError::RemoteRejected(m) if m == "bad code"
        ));
        assert!(matches!(
            AuthError::from(RemoteError::RateLimited {
                message: "slow down".into(),
                retry_after_secs: Some(30),
            }),
            AuthError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(30)
        ));
        assert!(matches!(
            AuthError::from(RemoteError::Network("reset".into())),
            AuthError::NetworkFailure(_)
        ));
    }

    #[test]
    fn retryable_errors() {
        assert!(AuthError::NetworkFailure("x".into()).is_retryable());
        assert!(!AuthError::RemoteRejected("x".into()).is_retryable());
        assert!(!AuthError::InvalidInput("x".into()).is_retryable());
    }

    #[test]
    fn invalid_step_message() {
        let err = AuthError::InvalidStep {
            action: "submit a code",
            actual: AuthStep::Phone,
        };
        assert_eq!(err.to_string(), "Cannot submit a code at the phone step");
    }
}
