//! Phone login wizard.
//!
//! `phone → code → (2fa) → success`. [`AuthMachine`] is the synchronous
//! state machine: every remote call goes out as a [`PendingCall`] and comes
//! back through the matching `complete_*` method with its [`Ticket`].
//! [`AuthFlow`] runs those calls against an
//! [`AuthBackend`](crate::backend::AuthBackend) for async callers.

mod error;
mod flow;
mod machine;
mod state;

pub use error::AuthError;
pub use flow::AuthFlow;
pub use machine::AuthMachine;
pub use state::{AuthStep, CallKind, PendingCall, RemoteRequest, Ticket};
