use crate::backend::RemoteError;
use crate::session::SessionError;
use crate::wizard::AuthError;

/// Crate-level error, for callers that mix the wizard, the session store and
/// their own backend calls behind one `?`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Backend error: {0}")]
    Remote(#[from] RemoteError),
}
