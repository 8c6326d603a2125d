use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use time::{OffsetDateTime, PrimitiveDateTime};

use super::error::AuthError;
use super::state::{AuthStep, CallKind, PendingCall, RemoteRequest, Ticket, WizardState};
use crate::backend::{CodeOutcome, Credentials, PhoneAccepted, RemoteError};
use crate::clock::Clock;
use crate::config::{ClientConfig, WizardSettings};
use crate::session::{SessionData, SessionStore};
use crate::types::{PhoneNumber, RunId};

const TOO_MANY_ATTEMPTS: &str = "Too many failed attempts. Please start again with your phone number.";
const SIGN_IN_FAILED: &str = "Sign-in could not be completed. Please try again.";

/// The call the wizard is waiting on.
#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    phone: PhoneNumber,
}

/// Phone → code → (2FA) → success login state machine.
///
/// Remote calls are explicit messages: a `begin_*` method validates the
/// input and returns a [`PendingCall`]; the caller performs the request and
/// feeds the typed result to the matching `complete_*` method. While a call
/// is in flight every other `begin_*` fails with [`AuthError::Busy`], and a
/// result whose ticket is not the awaited one fails with
/// [`AuthError::StaleResponse`] without touching the state.
///
/// [`AuthFlow`](super::AuthFlow) drives this against an
/// [`AuthBackend`](crate::backend::AuthBackend).
pub struct AuthMachine {
    settings: WizardSettings,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    run: RunId,
    seq: u64,
    state: WizardState,
    in_flight: Option<InFlight>,
    error: Option<String>,
}

impl std::fmt::Debug for AuthMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMachine")
            .field("run", &self.run)
            .field("step", &self.state.step())
            .field("busy", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthMachine {
    /// A fresh wizard at the phone step. Sessions are persisted to `store`,
    /// and time is read from the store's clock.
    #[must_use]
    pub fn new(config: &ClientConfig, store: SessionStore) -> Self {
        let clock = store.clock().clone();
        Self {
            settings: config.wizard,
            store,
            clock,
            run: RunId::generate(),
            seq: 0,
            state: WizardState::Phone,
            in_flight: None,
            error: None,
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    #[must_use]
    pub fn step(&self) -> AuthStep {
        self.state.step()
    }

    /// Phone number accepted by the backend for this run.
    #[must_use]
    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.state.phone()
    }

    /// Text of the last surfaced error, cleared by the next successful transition.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Failed submissions at the current code or 2FA step.
    #[must_use]
    pub fn failed_attempts(&self) -> u32 {
        self.state.failed_attempts()
    }

    /// When a new code may be requested, while at the code step.
    #[must_use]
    pub fn resend_available_at(&self) -> Option<OffsetDateTime> {
        match &self.state {
            WizardState::Code { resend_at, .. } => Some(*resend_at),
            _ => None,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// `true` while a remote call is awaited.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    // ── Phone ──────────────────────────────────────────────────────────

    /// Validate the phone number and request a verification code.
    ///
    /// # Errors
    ///
    /// [`AuthError::Busy`], [`AuthError::InvalidStep`] unless at the phone
    /// step, or [`AuthError::InvalidInput`] if the number is not plausible.
    pub fn begin_phone(&mut self, input: &str) -> Result<PendingCall, AuthError> {
        self.ensure_idle()?;
        if !matches!(self.state, WizardState::Phone) {
            return Err(self.wrong_step("submit a phone number"));
        }
        let phone = input.parse::<PhoneNumber>().map_err(|e| self.fail(e))?;
        Ok(self.dispatch(CallKind::SendPhone, phone.clone(), RemoteRequest::SendPhone { phone }))
    }

    /// Apply the result of a phone submission. Moves to the code step on
    /// success and starts the resend cooldown.
    ///
    /// # Errors
    ///
    /// [`AuthError::StaleResponse`] for a foreign ticket, otherwise the
    /// remote failure. The wizard stays at the phone step on failure.
    pub fn complete_phone(
        &mut self,
        ticket: Ticket,
        result: Result<PhoneAccepted, RemoteError>,
    ) -> Result<AuthStep, AuthError> {
        let call = self.accept(ticket, CallKind::SendPhone)?;
        let accepted = result.map_err(|e| self.fail(e.into()))?;

        let resend_at = self.cooldown_deadline(&accepted);
        tracing::debug!(run = %self.run, phone = %call.phone, "Verification code sent");
        self.state = WizardState::Code {
            phone: call.phone,
            resend_at,
            failed_attempts: 0,
        };
        self.error = None;
        Ok(AuthStep::Code)
    }

    // ── Code ───────────────────────────────────────────────────────────

    /// Submit the verification code.
    ///
    /// # Errors
    ///
    /// [`AuthError::Busy`], [`AuthError::InvalidStep`] unless at the code
    /// step, or [`AuthError::InvalidInput`] for an empty code.
    pub fn begin_code(&mut self, code: &str) -> Result<PendingCall, AuthError> {
        self.ensure_idle()?;
        let phone = match &self.state {
            WizardState::Code { phone, .. } => phone.clone(),
            _ => return Err(self.wrong_step("submit a code")),
        };
        let code = code.trim();
        if code.is_empty() {
            return Err(self.fail(AuthError::InvalidInput(
                "Verification code is required".into(),
            )));
        }
        Ok(self.dispatch(
            CallKind::SendCode,
            phone.clone(),
            RemoteRequest::SendCode {
                phone,
                code: code.to_owned(),
            },
        ))
    }

    /// Apply the result of a code submission.
    ///
    /// Moves to the 2FA step when the backend asks for a password, or to
    /// success after persisting the issued session. A rejected code counts
    /// as a failed attempt; at the configured ceiling the wizard restarts at
    /// the phone step.
    ///
    /// # Errors
    ///
    /// [`AuthError::StaleResponse`] for a foreign ticket, the remote failure,
    /// [`AuthError::RateLimited`] when the attempt ceiling is reached, or
    /// [`AuthError::Session`] if the issued session is unusable.
    pub fn complete_code(
        &mut self,
        ticket: Ticket,
        result: Result<CodeOutcome, RemoteError>,
    ) -> Result<AuthStep, AuthError> {
        let call = self.accept(ticket, CallKind::SendCode)?;
        match result {
            Ok(CodeOutcome::TwoFactorRequired) => {
                tracing::debug!(run = %self.run, "Two-factor password required");
                self.state = WizardState::TwoFactor {
                    phone: call.phone,
                    failed_attempts: 0,
                };
                self.error = None;
                Ok(AuthStep::TwoFactor)
            }
            Ok(CodeOutcome::Authenticated(credentials)) => self.finish(call.phone, credentials),
            Err(e) => Err(self.record_failure(e)),
        }
    }

    // ── Two-factor ─────────────────────────────────────────────────────

    /// Submit the two-factor password.
    ///
    /// # Errors
    ///
    /// [`AuthError::Busy`], [`AuthError::InvalidStep`] unless at the 2FA
    /// step, or [`AuthError::InvalidInput`] for an empty password.
    pub fn begin_password(&mut self, password: SecretString) -> Result<PendingCall, AuthError> {
        self.ensure_idle()?;
        let phone = match &self.state {
            WizardState::TwoFactor { phone, .. } => phone.clone(),
            _ => return Err(self.wrong_step("submit a password")),
        };
        if password.expose_secret().is_empty() {
            return Err(self.fail(AuthError::InvalidInput("Password is required".into())));
        }
        Ok(self.dispatch(
            CallKind::SendPassword,
            phone.clone(),
            RemoteRequest::SendPassword { phone, password },
        ))
    }

    /// Apply the result of a password submission. Same persistence and
    /// attempt rules as [`complete_code`](Self::complete_code).
    ///
    /// # Errors
    ///
    /// As for [`complete_code`](Self::complete_code).
    pub fn complete_password(
        &mut self,
        ticket: Ticket,
        result: Result<Credentials, RemoteError>,
    ) -> Result<AuthStep, AuthError> {
        let call = self.accept(ticket, CallKind::SendPassword)?;
        match result {
            Ok(credentials) => self.finish(call.phone, credentials),
            Err(e) => Err(self.record_failure(e)),
        }
    }

    // ── Resend ─────────────────────────────────────────────────────────

    /// Request a new verification code.
    ///
    /// # Errors
    ///
    /// [`AuthError::Busy`], [`AuthError::InvalidStep`] unless at the code
    /// step, or [`AuthError::RateLimited`] (with the remaining wait) while
    /// the cooldown is running.
    pub fn begin_resend(&mut self) -> Result<PendingCall, AuthError> {
        self.ensure_idle()?;
        let (phone, resend_at) = match &self.state {
            WizardState::Code {
                phone, resend_at, ..
            } => (phone.clone(), *resend_at),
            _ => return Err(self.wrong_step("resend the code")),
        };

        let now = self.clock.now();
        if now < resend_at {
            let wait = Duration::try_from(resend_at - now).unwrap_or_default();
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            return Err(self.fail(AuthError::RateLimited {
                message: format!("Please wait {secs}s before requesting a new code"),
                retry_after: Some(wait),
            }));
        }

        Ok(self.dispatch(CallKind::Resend, phone.clone(), RemoteRequest::Resend { phone }))
    }

    /// Apply the result of a resend. Restarts the cooldown; the step and the
    /// failed-attempt count are unchanged.
    ///
    /// # Errors
    ///
    /// [`AuthError::StaleResponse`] for a foreign ticket, otherwise the
    /// remote failure.
    pub fn complete_resend(
        &mut self,
        ticket: Ticket,
        result: Result<PhoneAccepted, RemoteError>,
    ) -> Result<AuthStep, AuthError> {
        self.accept(ticket, CallKind::Resend)?;
        let accepted = result.map_err(|e| self.fail(e.into()))?;

        let deadline = self.cooldown_deadline(&accepted);
        if let WizardState::Code { resend_at, .. } = &mut self.state {
            *resend_at = deadline;
        }
        self.error = None;
        tracing::debug!(run = %self.run, "Verification code re-sent");
        Ok(AuthStep::Code)
    }

    // ── Reset ──────────────────────────────────────────────────────────

    /// Back to the phone step with all wizard data cleared. Any persisted
    /// session is left alone. Results of calls issued before the reset are
    /// rejected as stale.
    pub fn reset(&mut self) {
        self.restart();
        tracing::debug!(run = %self.run, "Wizard reset");
    }

    /// Stop waiting for the in-flight call, if any; its result will be
    /// rejected as stale. Returns whether a call was abandoned.
    pub fn abandon_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(call) => {
                tracing::debug!(run = %self.run, kind = %call.ticket.kind, "Abandoned in-flight call");
                true
            }
            None => false,
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<(), AuthError> {
        if self.in_flight.is_some() {
            return Err(AuthError::Busy);
        }
        Ok(())
    }

    fn wrong_step(&self, action: &'static str) -> AuthError {
        AuthError::InvalidStep {
            action,
            actual: self.state.step(),
        }
    }

    fn dispatch(&mut self, kind: CallKind, phone: PhoneNumber, request: RemoteRequest) -> PendingCall {
        self.seq += 1;
        let ticket = Ticket {
            run: self.run,
            seq: self.seq,
            kind,
        };
        self.in_flight = Some(InFlight { ticket, phone });
        tracing::debug!(run = %self.run, seq = self.seq, %kind, "Remote call dispatched");
        PendingCall { ticket, request }
    }

    fn accept(&mut self, ticket: Ticket, kind: CallKind) -> Result<InFlight, AuthError> {
        match self.in_flight.take() {
            Some(call) if call.ticket == ticket && ticket.kind == kind => Ok(call),
            awaited => {
                self.in_flight = awaited;
                tracing::warn!(
                    run = %ticket.run,
                    seq = ticket.seq,
                    kind = %ticket.kind,
                    "Discarding stale response"
                );
                Err(AuthError::StaleResponse)
            }
        }
    }

    fn cooldown_deadline(&self, accepted: &PhoneAccepted) -> OffsetDateTime {
        let cooldown = accepted
            .cooldown_seconds
            .map_or(self.settings.resend_cooldown, Duration::from_secs);
        // Saturates: the backend may send any u64.
        let cooldown = time::Duration::try_from(cooldown).unwrap_or(time::Duration::MAX);
        self.clock
            .now()
            .checked_add(cooldown)
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
    }

    fn finish(&mut self, phone: PhoneNumber, credentials: Credentials) -> Result<AuthStep, AuthError> {
        let session = SessionData::from_credentials(phone.clone(), credentials);
        if let Err(e) = self.store.save(&session) {
            self.error = Some(SIGN_IN_FAILED.to_owned());
            return Err(e.into());
        }

        tracing::info!(user_id = %session.user_id, run = %self.run, "Login successful");
        self.state = WizardState::Success { phone };
        self.error = None;
        Ok(self.state.step())
    }

    /// Counts a rejected code/password and enforces the attempt ceiling.
    /// Network failures are not the user's fault and are not counted.
    fn record_failure(&mut self, e: RemoteError) -> AuthError {
        let err = AuthError::from(e);
        if matches!(err, AuthError::NetworkFailure(_)) {
            return self.fail(err);
        }

        let attempts = match &mut self.state {
            WizardState::Code {
                failed_attempts, ..
            }
            | WizardState::TwoFactor {
                failed_attempts, ..
            } => {
                *failed_attempts += 1;
                *failed_attempts
            }
            WizardState::Phone | WizardState::Success { .. } => 0,
        };

        if attempts >= self.settings.max_failed_attempts {
            tracing::warn!(
                run = %self.run,
                attempts,
                step = %self.state.step(),
                "Attempt limit reached, restarting wizard"
            );
            self.restart();
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "Failed to clear session after forced reset");
            }
            return self.fail(AuthError::RateLimited {
                message: TOO_MANY_ATTEMPTS.into(),
                retry_after: None,
            });
        }

        self.fail(err)
    }

    fn restart(&mut self) {
        self.run = RunId::generate();
        self.state = WizardState::Phone;
        self.in_flight = None;
        self.error = None;
    }

    /// Records the error text for display and hands the error back.
    fn fail(&mut self, err: AuthError) -> AuthError {
        tracing::warn!(run = %self.run, step = %self.state.step(), error = %err, "Auth step failed");
        self.error = Some(err.to_string());
        err
    }
}
