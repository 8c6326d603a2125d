use derive_more::Display;
use serde::Serialize;

use super::snapshot::{Plan, UsageSnapshot};

/// Kind of copy job a user may try to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum JobKind {
    #[display("Historical")]
    Historical,
    #[display("Real-time")]
    Realtime,
}

/// What the user may do next, derived from one [`UsageSnapshot`].
///
/// A pure projection: recomputed for every snapshot, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatingResult {
    /// Message volume used, 0-100. Always 0 when the message volume is unlimited.
    pub usage_percentage: u8,
    pub can_create_historical_job: bool,
    pub can_create_realtime_job: bool,
    /// Some job of some kind can be created right now.
    pub can_create_job: bool,
    pub historical_job_blocked_reason: Option<String>,
    pub realtime_job_blocked_reason: Option<String>,
    pub message_limit_blocked_reason: Option<String>,
    /// Single banner text summarising the most restrictive block, if any.
    pub limit_message: Option<String>,
}

impl GatingResult {
    /// Whether a job of `kind` may be created. The message cap blocks every kind.
    #[must_use]
    pub fn can_create(&self, kind: JobKind) -> bool {
        self.message_limit_blocked_reason.is_none()
            && match kind {
                JobKind::Historical => self.can_create_historical_job,
                JobKind::Realtime => self.can_create_realtime_job,
            }
    }

    /// Why a job of `kind` may not be created, or `None` if it may.
    #[must_use]
    pub fn blocked_reason(&self, kind: JobKind) -> Option<&str> {
        self.message_limit_blocked_reason
            .as_deref()
            .or(match kind {
                JobKind::Historical => self.historical_job_blocked_reason.as_deref(),
                JobKind::Realtime => self.realtime_job_blocked_reason.as_deref(),
            })
    }
}

const PLAN_LIMITS_REACHED: &str = "You have reached the limits of your plan. Upgrade to continue.";

/// Computes the gating decision for a snapshot.
///
/// Deterministic and side-effect free: the same snapshot always yields the
/// same result.
#[must_use]
pub fn evaluate(snapshot: &UsageSnapshot) -> GatingResult {
    let plan = snapshot.plan;

    let historical_job_blocked_reason = job_block(
        JobKind::Historical,
        plan,
        snapshot.historical_jobs_count,
        snapshot.historical_jobs_limit,
    );
    let realtime_job_blocked_reason = job_block(
        JobKind::Realtime,
        plan,
        snapshot.realtime_jobs_count,
        snapshot.realtime_jobs_limit,
    );
    let message_limit_blocked_reason =
        message_block(plan, snapshot.usage_count, snapshot.usage_limit);

    let can_create_historical_job = historical_job_blocked_reason.is_none();
    let can_create_realtime_job = realtime_job_blocked_reason.is_none();
    let can_create_job = message_limit_blocked_reason.is_none()
        && (can_create_historical_job || can_create_realtime_job);

    let limit_message = if let Some(reason) = &message_limit_blocked_reason {
        Some(reason.clone())
    } else if !can_create_historical_job && !can_create_realtime_job {
        Some(PLAN_LIMITS_REACHED.to_owned())
    } else {
        historical_job_blocked_reason
            .clone()
            .or_else(|| realtime_job_blocked_reason.clone())
    };

    GatingResult {
        usage_percentage: usage_percentage(snapshot.usage_count, snapshot.usage_limit),
        can_create_historical_job,
        can_create_realtime_job,
        can_create_job,
        historical_job_blocked_reason,
        realtime_job_blocked_reason,
        message_limit_blocked_reason,
        limit_message,
    }
}

/// Recomputes the gating locally and compares it with any flags the backend
/// reported. Disagreements are logged; the local result always wins.
#[must_use]
pub fn reconcile(snapshot: &UsageSnapshot) -> GatingResult {
    let computed = evaluate(snapshot);
    let reported = &snapshot.reported;

    let checks = [
        (
            "can_create_historical_job",
            reported.can_create_historical_job,
            computed.can_create_historical_job,
        ),
        (
            "can_create_realtime_job",
            reported.can_create_realtime_job,
            computed.can_create_realtime_job,
        ),
        ("can_create_job", reported.can_create_job, computed.can_create_job),
    ];
    for (field, reported, computed) in checks {
        if reported.is_some_and(|reported| reported != computed) {
            tracing::warn!(
                field,
                reported = ?reported,
                computed,
                "Backend gating disagrees with local computation"
            );
        }
    }

    computed
}

/// `round(count / limit * 100)` capped at 100, half rounded up.
fn usage_percentage(count: u64, limit: Option<u64>) -> u8 {
    match limit {
        None => 0,
        Some(0) => 100,
        Some(limit) => {
            let (count, limit) = (u128::from(count), u128::from(limit));
            let pct = (count * 200 + limit) / (2 * limit);
            u8::try_from(pct.min(100)).unwrap_or(100)
        }
    }
}

fn job_block(kind: JobKind, plan: Plan, count: u64, limit: Option<u64>) -> Option<String> {
    let limit = limit?;
    if count < limit {
        return None;
    }

    let lead = if limit == 0 {
        format!("{kind} jobs are not available on the {plan} plan.")
    } else {
        format!("{kind} job limit reached ({count}/{limit}).")
    };
    Some(with_hint(lead, job_upgrade_hint(plan)))
}

fn message_block(plan: Plan, count: u64, limit: Option<u64>) -> Option<String> {
    let limit = limit?;
    if count < limit {
        return None;
    }
    let lead = format!("Daily message limit reached ({count}/{limit}).");
    Some(with_hint(lead, message_upgrade_hint(plan)))
}

fn job_upgrade_hint(plan: Plan) -> Option<&'static str> {
    match plan {
        Plan::Free => Some("Upgrade to Premium or Enterprise to create more jobs."),
        Plan::Premium => Some("Upgrade to Enterprise for unlimited jobs."),
        Plan::Enterprise => None,
    }
}

fn message_upgrade_hint(plan: Plan) -> Option<&'static str> {
    match plan {
        Plan::Free => Some("Upgrade to Premium or Enterprise for a higher daily limit."),
        Plan::Premium => Some("Upgrade to Enterprise for unlimited messages."),
        Plan::Enterprise => None,
    }
}

fn with_hint(lead: String, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!("{lead} {hint}"),
        None => lead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::snapshot::ReportedGating;

    fn snapshot(plan: Plan) -> UsageSnapshot {
        UsageSnapshot::new(plan)
    }

    #[test]
    fn message_cap_dominates_job_quotas() {
        let s = UsageSnapshot {
            usage_limit: Some(100),
            usage_count: 100,
            historical_jobs_limit: Some(5),
            historical_jobs_count: 5,
            realtime_jobs_limit: None,
            realtime_jobs_count: 3,
            ..snapshot(Plan::Premium)
        };
        let g = evaluate(&s);

        assert_eq!(g.usage_percentage, 100);
        assert!(!g.can_create_historical_job);
        assert!(g.historical_job_blocked_reason.is_some());
        assert!(g.can_create_realtime_job);
        assert_eq!(g.realtime_job_blocked_reason, None);
        assert!(g.message_limit_blocked_reason.is_some());
        assert!(!g.can_create_job);
        assert_eq!(g.limit_message, g.message_limit_blocked_reason);
    }

    #[test]
    fn zero_limit_blocks_before_any_job() {
        let s = UsageSnapshot {
            usage_limit: None,
            historical_jobs_limit: Some(0),
            historical_jobs_count: 0,
            realtime_jobs_limit: Some(10),
            realtime_jobs_count: 2,
            ..snapshot(Plan::Free)
        };
        let g = evaluate(&s);

        assert_eq!(g.usage_percentage, 0);
        assert!(!g.can_create_historical_job);
        assert!(g.can_create_realtime_job);
        assert!(g.can_create_job);
        assert_eq!(g.message_limit_blocked_reason, None);
        assert_eq!(
            g.historical_job_blocked_reason.as_deref(),
            Some(
                "Historical jobs are not available on the Free plan. \
                 Upgrade to Premium or Enterprise to create more jobs."
            )
        );
    }

    #[test]
    fn null_limits_never_block() {
        let s = UsageSnapshot {
            usage_count: 1_000_000,
            historical_jobs_count: 500,
            realtime_jobs_count: 500,
            ..snapshot(Plan::Enterprise)
        };
        let g = evaluate(&s);

        assert_eq!(g.usage_percentage, 0);
        assert!(g.can_create_historical_job && g.can_create_realtime_job && g.can_create_job);
        assert_eq!(g.limit_message, None);
    }

    #[test]
    fn reason_names_count_and_limit() {
        let s = UsageSnapshot {
            realtime_jobs_limit: Some(5),
            realtime_jobs_count: 6,
            ..snapshot(Plan::Premium)
        };
        let g = evaluate(&s);

        assert_eq!(
            g.realtime_job_blocked_reason.as_deref(),
            Some("Real-time job limit reached (6/5). Upgrade to Enterprise for unlimited jobs.")
        );
        assert_eq!(g.limit_message, g.realtime_job_blocked_reason);
    }

    #[test]
    fn enterprise_custom_limit_has_no_upgrade_hint() {
        let s = UsageSnapshot {
            historical_jobs_limit: Some(2),
            historical_jobs_count: 2,
            ..snapshot(Plan::Enterprise)
        };
        assert_eq!(
            evaluate(&s).historical_job_blocked_reason.as_deref(),
            Some("Historical job limit reached (2/2).")
        );
    }

    #[test]
    fn both_quotas_exhausted_blocks_job_creation() {
        let s = UsageSnapshot {
            usage_limit: Some(1_000),
            usage_count: 10,
            historical_jobs_limit: Some(3),
            historical_jobs_count: 3,
            realtime_jobs_limit: Some(0),
            ..snapshot(Plan::Free)
        };
        let g = evaluate(&s);

        assert!(!g.can_create_job);
        assert_eq!(g.message_limit_blocked_reason, None);
        assert_eq!(g.limit_message.as_deref(), Some(PLAN_LIMITS_REACHED));
    }

    #[test]
    fn usage_percentage_rounding() {
        assert_eq!(usage_percentage(0, Some(1_000)), 0);
        assert_eq!(usage_percentage(1, Some(3)), 33);
        assert_eq!(usage_percentage(2, Some(3)), 67);
        assert_eq!(usage_percentage(1, Some(200)), 1);
        assert_eq!(usage_percentage(999, Some(1_000)), 100);
        assert_eq!(usage_percentage(5_000, Some(1_000)), 100);
        assert_eq!(usage_percentage(u64::MAX, Some(1)), 100);
        assert_eq!(usage_percentage(42, None), 0);
    }

    #[test]
    fn zero_usage_limit_is_exhausted() {
        let s = UsageSnapshot {
            usage_limit: Some(0),
            ..snapshot(Plan::Free)
        };
        let g = evaluate(&s);
        assert_eq!(g.usage_percentage, 100);
        assert!(g.message_limit_blocked_reason.is_some());
        assert!(!g.can_create_job);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let s = UsageSnapshot {
            usage_limit: Some(10_000),
            usage_count: 4_321,
            historical_jobs_limit: Some(20),
            historical_jobs_count: 20,
            realtime_jobs_limit: Some(5),
            realtime_jobs_count: 1,
            ..snapshot(Plan::Premium)
        };
        assert_eq!(evaluate(&s), evaluate(&s));
        assert_eq!(evaluate(&s), reconcile(&s));
    }

    #[test]
    fn per_kind_checks_respect_message_cap() {
        let s = UsageSnapshot {
            usage_limit: Some(10),
            usage_count: 10,
            ..snapshot(Plan::Free)
        };
        let g = evaluate(&s);
        assert!(g.can_create_historical_job);
        assert!(!g.can_create(JobKind::Historical));
        assert_eq!(
            g.blocked_reason(JobKind::Historical),
            g.message_limit_blocked_reason.as_deref()
        );

        let s = UsageSnapshot {
            realtime_jobs_limit: Some(0),
            ..snapshot(Plan::Free)
        };
        let g = evaluate(&s);
        assert!(g.can_create(JobKind::Historical));
        assert_eq!(g.blocked_reason(JobKind::Historical), None);
        assert!(!g.can_create(JobKind::Realtime));
    }

    #[test]
    fn recomputation_matches_backend_flags() {
        let s = UsageSnapshot {
            usage_limit: Some(1_000),
            usage_count: 1_000,
            historical_jobs_limit: Some(3),
            historical_jobs_count: 1,
            realtime_jobs_limit: Some(0),
            reported: ReportedGating {
                can_create_historical_job: Some(true),
                can_create_realtime_job: Some(false),
                can_create_job: Some(false),
            },
            ..snapshot(Plan::Free)
        };
        let g = reconcile(&s);
        assert_eq!(Some(g.can_create_historical_job), s.reported.can_create_historical_job);
        assert_eq!(Some(g.can_create_realtime_job), s.reported.can_create_realtime_job);
        assert_eq!(Some(g.can_create_job), s.reported.can_create_job);
    }

    #[test]
    fn reconcile_prefers_local_result() {
        let s = UsageSnapshot {
            reported: ReportedGating {
                can_create_job: Some(false),
                ..ReportedGating::default()
            },
            ..snapshot(Plan::Enterprise)
        };
        assert!(reconcile(&s).can_create_job);
    }
}
