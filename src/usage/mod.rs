//! Plan usage gating.
//!
//! [`evaluate`] turns a backend [`UsageSnapshot`] into a [`GatingResult`]:
//! which job kinds the user may create and, when blocked, why. Job-count
//! quotas are checked per kind; the daily message cap blocks everything.

mod gating;
mod plans;
mod snapshot;

pub use gating::{GatingResult, JobKind, evaluate, reconcile};
pub use plans::{PlanFeature, PlanInfo, builtin_plans, find_plan};
pub use snapshot::{Plan, ReportedGating, UsageSnapshot};

use crate::backend::{RemoteError, UsageSource};
use crate::session::SessionData;

/// Fetches a fresh snapshot for the session's user and gates it.
///
/// # Errors
///
/// Returns the [`RemoteError`] of the usage call unchanged.
pub async fn fetch_gating<U: UsageSource>(
    source: &U,
    session: &SessionData,
) -> Result<GatingResult, RemoteError> {
    let snapshot = source.usage_stats(&session.phone_number).await?;
    Ok(reconcile(&snapshot))
}

/// Fetches the plan catalog, falling back to [`builtin_plans`] when the
/// backend is unreachable or returns nothing.
pub async fn fetch_plans<U: UsageSource>(source: &U) -> Vec<PlanInfo> {
    match source.plans().await {
        Ok(plans) if !plans.is_empty() => plans,
        Ok(_) => {
            tracing::warn!("Backend returned an empty plan catalog, using built-in plans");
            builtin_plans()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Plan catalog fetch failed, using built-in plans");
            builtin_plans()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhoneNumber;

    struct FixedSource {
        snapshot: Result<UsageSnapshot, RemoteError>,
        plans: Result<Vec<PlanInfo>, RemoteError>,
    }

    impl UsageSource for FixedSource {
        async fn usage_stats(&self, _phone: &PhoneNumber) -> Result<UsageSnapshot, RemoteError> {
            self.snapshot.clone()
        }

        async fn plans(&self) -> Result<Vec<PlanInfo>, RemoteError> {
            self.plans.clone()
        }
    }

    fn session() -> SessionData {
        serde_json::from_value(serde_json::json!({
            "phoneNumber": "+5511999990000",
            "userId": 1,
            "apiId": 2,
            "apiHash": "h",
            "isAuthenticated": true,
            "expiresAt": 4_000_000_000_000_i64,
            "accessToken": "t",
            "tokenType": "bearer"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_gating_evaluates_snapshot() {
        let source = FixedSource {
            snapshot: Ok(UsageSnapshot {
                usage_limit: Some(1_000),
                usage_count: 250,
                ..UsageSnapshot::new(Plan::Free)
            }),
            plans: Ok(Vec::new()),
        };
        let gating = fetch_gating(&source, &session()).await.unwrap();
        assert_eq!(gating.usage_percentage, 25);
        assert!(gating.can_create_job);
    }

    #[tokio::test]
    async fn fetch_gating_propagates_remote_error() {
        let source = FixedSource {
            snapshot: Err(RemoteError::Network("offline".into())),
            plans: Ok(Vec::new()),
        };
        assert_eq!(
            fetch_gating(&source, &session()).await,
            Err(RemoteError::Network("offline".into()))
        );
    }

    #[tokio::test]
    async fn fetch_plans_falls_back_to_builtin() {
        let failing = FixedSource {
            snapshot: Err(RemoteError::Network("offline".into())),
            plans: Err(RemoteError::Network("offline".into())),
        };
        assert_eq!(fetch_plans(&failing).await, builtin_plans());

        let empty = FixedSource {
            snapshot: Err(RemoteError::Network("offline".into())),
            plans: Ok(Vec::new()),
        };
        assert_eq!(fetch_plans(&empty).await, builtin_plans());
    }

    #[tokio::test]
    async fn fetch_plans_prefers_backend_catalog() {
        let mut plans = builtin_plans();
        plans.truncate(1);
        let source = FixedSource {
            snapshot: Err(RemoteError::Network("offline".into())),
            plans: Ok(plans.clone()),
        };
        assert_eq!(fetch_plans(&source).await, plans);
    }
}
