use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[display("Free")]
    Free,
    #[display("Premium")]
    Premium,
    #[display("Enterprise")]
    Enterprise,
}

/// Point-in-time usage counters reported by the backend.
///
/// Limits of `None` mean unlimited. A limit of `Some(0)` means none allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub plan: Plan,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub usage_limit: Option<u64>,
    #[serde(default)]
    pub active_jobs_count: u64,
    #[serde(default)]
    pub total_jobs_count: u64,
    #[serde(default)]
    pub historical_jobs_count: u64,
    #[serde(default)]
    pub realtime_jobs_count: u64,
    #[serde(default)]
    pub historical_jobs_limit: Option<u64>,
    #[serde(default)]
    pub realtime_jobs_limit: Option<u64>,
    /// Gating fields the backend may have computed itself.
    #[serde(flatten)]
    pub reported: ReportedGating,
}

impl UsageSnapshot {
    /// Snapshot with zeroed counters and no limits.
    #[must_use]
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            usage_count: 0,
            usage_limit: None,
            active_jobs_count: 0,
            total_jobs_count: 0,
            historical_jobs_count: 0,
            realtime_jobs_count: 0,
            historical_jobs_limit: None,
            realtime_jobs_limit: None,
            reported: ReportedGating::default(),
        }
    }
}

/// Backend-computed gating flags carried alongside the raw counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedGating {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_create_historical_job: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_create_realtime_job: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_create_job: Option<bool>,
}

impl ReportedGating {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.can_create_historical_job.is_none()
            && self.can_create_realtime_job.is_none()
            && self.can_create_job.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_payload() {
        let json = r#"{
            "phone_number": "+5511999990000",
            "plan": "premium",
            "usage_count": 120,
            "usage_limit": 10000,
            "usage_percentage": 1.2,
            "active_jobs_count": 2,
            "total_jobs_count": 9,
            "historical_jobs_count": 7,
            "realtime_jobs_count": 2,
            "historical_jobs_limit": 20,
            "realtime_jobs_limit": 5,
            "can_create_historical_job": true,
            "can_create_realtime_job": true,
            "can_create_job": true
        }"#;
        let snapshot: UsageSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.plan, Plan::Premium);
        assert_eq!(snapshot.usage_limit, Some(10_000));
        assert_eq!(snapshot.historical_jobs_limit, Some(20));
        assert_eq!(snapshot.reported.can_create_job, Some(true));
    }

    #[test]
    fn null_limits_are_unlimited() {
        let json = r#"{
            "plan": "enterprise",
            "usage_count": 5,
            "usage_limit": null,
            "historical_jobs_limit": null,
            "realtime_jobs_limit": null
        }"#;
        let snapshot: UsageSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.usage_limit, None);
        assert_eq!(snapshot.realtime_jobs_limit, None);
        assert!(snapshot.reported.is_empty());
    }

    #[test]
    fn plan_display() {
        assert_eq!(Plan::Free.to_string(), "Free");
        assert_eq!(serde_json::to_string(&Plan::Enterprise).unwrap(), "\"enterprise\"");
    }
}
