#![doc = include_str!("../README.md")]

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod phone;
pub mod session;
pub mod types;
pub mod usage;
pub mod wizard;

// Re-exports for convenient access
pub use backend::{AuthBackend, CodeOutcome, Credentials, PhoneAccepted, RemoteError, UsageSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use error::Error;
pub use phone::is_plausible_phone;
#[cfg(feature = "file-store")]
pub use session::FileStorage;
pub use session::{MemoryStorage, SessionData, SessionError, SessionStorage, SessionStore};
pub use types::{ApiId, PhoneNumber, RunId, UserId};
pub use usage::{
    GatingResult, JobKind, Plan, PlanInfo, UsageSnapshot, evaluate, fetch_gating, fetch_plans,
};
pub use wizard::{AuthError, AuthFlow, AuthMachine, AuthStep, PendingCall, RemoteRequest, Ticket};
