use derive_more::Display;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{PhoneNumber, RunId};

/// Wizard position, for choosing which screen to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AuthStep {
    #[serde(rename = "phone")]
    #[display("phone")]
    Phone,
    #[serde(rename = "code")]
    #[display("code")]
    Code,
    #[serde(rename = "2fa")]
    #[display("2fa")]
    TwoFactor,
    #[serde(rename = "success")]
    #[display("success")]
    Success,
}

/// Wizard state with the data each step owns.
#[derive(Debug, Clone)]
pub(crate) enum WizardState {
    Phone,
    Code {
        phone: PhoneNumber,
        resend_at: OffsetDateTime,
        failed_attempts: u32,
    },
    TwoFactor {
        phone: PhoneNumber,
        failed_attempts: u32,
    },
    Success {
        phone: PhoneNumber,
    },
}

impl WizardState {
    pub(crate) fn step(&self) -> AuthStep {
        match self {
            Self::Phone => AuthStep::Phone,
            Self::Code { .. } => AuthStep::Code,
            Self::TwoFactor { .. } => AuthStep::TwoFactor,
            Self::Success { .. } => AuthStep::Success,
        }
    }

    pub(crate) fn phone(&self) -> Option<&PhoneNumber> {
        match self {
            Self::Phone => None,
            Self::Code { phone, .. } | Self::TwoFactor { phone, .. } | Self::Success { phone } => {
                Some(phone)
            }
        }
    }

    pub(crate) fn failed_attempts(&self) -> u32 {
        match self {
            Self::Code {
                failed_attempts, ..
            }
            | Self::TwoFactor {
                failed_attempts, ..
            } => *failed_attempts,
            Self::Phone | Self::Success { .. } => 0,
        }
    }
}

/// Which remote operation a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CallKind {
    #[display("send phone")]
    SendPhone,
    #[display("send code")]
    SendCode,
    #[display("send password")]
    SendPassword,
    #[display("resend code")]
    Resend,
}

/// Identifies one remote call of one wizard run.
///
/// A result is applied only if its ticket is the one the wizard is waiting
/// for; results from a reset or torn-down run never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub(crate) run: RunId,
    pub(crate) seq: u64,
    pub(crate) kind: CallKind,
}

impl Ticket {
    #[must_use]
    pub fn run(&self) -> RunId {
        self.run
    }

    #[must_use]
    pub fn kind(&self) -> CallKind {
        self.kind
    }
}

/// Remote operation the caller must perform for a [`PendingCall`].
#[derive(Debug)]
#[non_exhaustive]
pub enum RemoteRequest {
    SendPhone { phone: PhoneNumber },
    SendCode { phone: PhoneNumber, code: String },
    SendPassword { phone: PhoneNumber, password: SecretString },
    Resend { phone: PhoneNumber },
}

/// A transition waiting on its remote call.
///
/// Perform `request`, then hand the typed result back with the matching
/// `complete_*` method of [`AuthMachine`](super::AuthMachine) and this ticket.
#[derive(Debug)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: RemoteRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wire_names() {
        assert_eq!(serde_json::to_string(&AuthStep::TwoFactor).unwrap(), "\"2fa\"");
        assert_eq!(
            serde_json::from_str::<AuthStep>("\"phone\"").unwrap(),
            AuthStep::Phone
        );
        assert_eq!(AuthStep::TwoFactor.to_string(), "2fa");
    }

    #[test]
    fn state_accessors() {
        let phone: PhoneNumber = "+1555".parse().unwrap();
        let state = WizardState::TwoFactor {
            phone: phone.clone(),
            failed_attempts: 2,
        };
        assert_eq!(state.step(), AuthStep::TwoFactor);
        assert_eq!(state.phone(), Some(&phone));
        assert_eq!(state.failed_attempts(), 2);
        assert_eq!(WizardState::Phone.phone(), None);
    }
}
