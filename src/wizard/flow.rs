use std::future::Future;
use std::time::Duration;

use secrecy::SecretString;

use super::error::AuthError;
use super::machine::AuthMachine;
use super::state::{AuthStep, PendingCall, RemoteRequest};
use crate::backend::{AuthBackend, RemoteError};
use crate::config::ClientConfig;
use crate::session::SessionStore;

/// Async driver pairing an [`AuthMachine`] with an [`AuthBackend`].
///
/// Each `submit_*` performs one transition end to end: validate, call the
/// backend under the configured timeout, apply the result. A timeout is
/// reported as [`AuthError::NetworkFailure`].
///
/// # Example
///
/// ```rust,ignore
/// let mut flow = AuthFlow::new(&config, backend, config.session_store());
/// flow.submit_phone("+5511999990000").await?;
/// match flow.submit_code(&code).await? {
///     AuthStep::TwoFactor => flow.submit_password(password).await?,
///     step => step,
/// };
/// ```
#[derive(Debug)]
pub struct AuthFlow<B> {
    machine: AuthMachine,
    backend: B,
    timeout: Duration,
}

impl<B: AuthBackend> AuthFlow<B> {
    #[must_use]
    pub fn new(config: &ClientConfig, backend: B, store: SessionStore) -> Self {
        Self {
            machine: AuthMachine::new(config, store),
            backend,
            timeout: config.remote_timeout(),
        }
    }

    #[must_use]
    pub fn machine(&self) -> &AuthMachine {
        &self.machine
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn step(&self) -> AuthStep {
        self.machine.step()
    }

    /// See [`AuthMachine::reset`].
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Submit the phone number and request a code.
    ///
    /// # Errors
    ///
    /// See [`AuthMachine::begin_phone`] and [`AuthMachine::complete_phone`].
    pub async fn submit_phone(&mut self, input: &str) -> Result<AuthStep, AuthError> {
        self.supersede();
        let call = self.machine.begin_phone(input)?;
        self.execute(call).await
    }

    /// Submit the verification code.
    ///
    /// # Errors
    ///
    /// See [`AuthMachine::begin_code`] and [`AuthMachine::complete_code`].
    pub async fn submit_code(&mut self, code: &str) -> Result<AuthStep, AuthError> {
        self.supersede();
        let call = self.machine.begin_code(code)?;
        self.execute(call).await
    }

    /// Submit the two-factor password.
    ///
    /// # Errors
    ///
    /// See [`AuthMachine::begin_password`] and
    /// [`AuthMachine::complete_password`].
    pub async fn submit_password(&mut self, password: SecretString) -> Result<AuthStep, AuthError> {
        self.supersede();
        let call = self.machine.begin_password(password)?;
        self.execute(call).await
    }

    /// Ask for a new verification code once the cooldown has passed.
    ///
    /// # Errors
    ///
    /// See [`AuthMachine::begin_resend`] and [`AuthMachine::complete_resend`].
    pub async fn resend_code(&mut self) -> Result<AuthStep, AuthError> {
        self.supersede();
        let call = self.machine.begin_resend()?;
        self.execute(call).await
    }

    /// A submit future dropped mid-call leaves its ticket in flight.
    /// `&mut self` means no other submit is running, so that call is dead.
    fn supersede(&mut self) {
        if self.machine.abandon_in_flight() {
            tracing::debug!(run = %self.machine.run_id(), "Superseded a cancelled call");
        }
    }

    async fn execute(&mut self, call: PendingCall) -> Result<AuthStep, AuthError> {
        let PendingCall { ticket, request } = call;
        match request {
            RemoteRequest::SendPhone { phone } => {
                let result = with_timeout(self.timeout, self.backend.send_phone(&phone)).await;
                self.machine.complete_phone(ticket, result)
            }
            RemoteRequest::SendCode { phone, code } => {
                let result = with_timeout(self.timeout, self.backend.send_code(&phone, &code)).await;
                self.machine.complete_code(ticket, result)
            }
            RemoteRequest::SendPassword { phone, password } => {
                let result =
                    with_timeout(self.timeout, self.backend.send_2fa(&phone, &password)).await;
                self.machine.complete_password(ticket, result)
            }
            RemoteRequest::Resend { phone } => {
                let result = with_timeout(self.timeout, self.backend.send_phone(&phone)).await;
                self.machine.complete_resend(ticket, result)
            }
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, RemoteError>>,
) -> Result<T, RemoteError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis(), "Backend call timed out");
            Err(RemoteError::Network(format!(
                "Request timed out after {}s",
                limit.as_secs()
            )))
        }
    }
}
