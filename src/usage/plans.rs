use serde::{Deserialize, Serialize};

use super::snapshot::Plan;

/// One line of a plan's feature list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFeature {
    pub name: String,
    pub description: String,
    pub included: bool,
}

/// Catalog entry describing a plan tier. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    #[serde(rename = "type")]
    pub plan: Plan,
    pub name: String,
    /// Display price, already formatted.
    pub price: String,
    pub features: Vec<PlanFeature>,
    /// Daily message limit. `None` = unlimited.
    #[serde(default)]
    pub usage_limit: Option<u64>,
    #[serde(default)]
    pub historical_jobs_limit: Option<u64>,
    #[serde(default)]
    pub realtime_jobs_limit: Option<u64>,
    pub real_time_copy: bool,
    pub media_copy: bool,
    pub priority_support: bool,
}

fn feature(name: &str, description: &str, included: bool) -> PlanFeature {
    PlanFeature {
        name: name.to_owned(),
        description: description.to_owned(),
        included,
    }
}

/// The plan tiers as shipped, used when the backend catalog is unavailable.
#[must_use]
pub fn builtin_plans() -> Vec<PlanInfo> {
    vec![
        PlanInfo {
            plan: Plan::Free,
            name: "Free".into(),
            price: "R$ 0/month".into(),
            features: vec![
                feature("Up to 3 historical jobs", "At most 3 historical copy jobs", true),
                feature("1,000 messages per day", "Daily limit of 1,000 messages", true),
                feature("Media support", "Copy photos, videos and files", true),
                feature("Real-time jobs", "Copy messages as they arrive", false),
                feature("Priority support", "Priority customer service", false),
            ],
            usage_limit: Some(1_000),
            historical_jobs_limit: Some(3),
            realtime_jobs_limit: Some(0),
            real_time_copy: false,
            media_copy: true,
            priority_support: false,
        },
        PlanInfo {
            plan: Plan::Premium,
            name: "Premium".into(),
            price: "R$ 29,90/month".into(),
            features: vec![
                feature("Up to 20 historical jobs", "At most 20 historical copy jobs", true),
                feature("10,000 messages per day", "Daily limit of 10,000 messages", true),
                feature("Media support", "Copy photos, videos and files", true),
                feature("Up to 5 real-time jobs", "At most 5 concurrent real-time jobs", true),
                feature("Priority support", "Priority customer service", true),
            ],
            usage_limit: Some(10_000),
            historical_jobs_limit: Some(20),
            realtime_jobs_limit: Some(5),
            real_time_copy: true,
            media_copy: true,
            priority_support: true,
        },
        PlanInfo {
            plan: Plan::Enterprise,
            name: "Enterprise".into(),
            price: "R$ 99,90/month".into(),
            features: vec![
                feature("Unlimited historical jobs", "No limit on historical jobs", true),
                feature("Unlimited messages", "No daily message limit", true),
                feature("Media support", "Copy photos, videos and files", true),
                feature("Unlimited real-time jobs", "No limit on real-time jobs", true),
                feature("Priority support", "Priority customer service", true),
            ],
            usage_limit: None,
            historical_jobs_limit: None,
            realtime_jobs_limit: None,
            real_time_copy: true,
            media_copy: true,
            priority_support: true,
        },
    ]
}

/// Looks up a tier in a catalog.
#[must_use]
pub fn find_plan(plans: &[PlanInfo], plan: Plan) -> Option<&PlanInfo> {
    plans.iter().find(|info| info.plan == plan)
}
