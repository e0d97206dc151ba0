use serde::{Deserialize, Serialize};

/// Subscription plan a user's team is on. Derived from the subscription
/// status flag the billing provider maintains; everything that is not an
/// active paid subscription counts as the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn from_subscription_status(status: &str) -> Self {
        if status == "active" { Plan::Pro } else { Plan::Free }
    }

    /// Maximum number of messages a user on this plan may hold at once.
    pub fn message_quota(self) -> i64 {
        match self {
            Plan::Free => 1,
            Plan::Pro => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "general")]
    General,
    #[serde(rename = "support")]
    Support,
    #[serde(rename = "feature-request")]
    FeatureRequest,
    #[serde(rename = "bug-report")]
    BugReport,
    #[serde(rename = "feedback")]
    Feedback,
    #[serde(rename = "other")]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Support => "support",
            Category::FeatureRequest => "feature-request",
            Category::BugReport => "bug-report",
            Category::Feedback => "feedback",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Category::General),
            "support" => Some(Category::Support),
            "feature-request" => Some(Category::FeatureRequest),
            "bug-report" => Some(Category::BugReport),
            "feedback" => Some(Category::Feedback),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Moderation label on a message. Any of the four values may be set directly
/// by the owner or an admin; only `Pending` and `Completed` messages appear
/// in the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "in_progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            "rejected" => Some(Status::Rejected),
            _ => None,
        }
    }

    pub fn is_feed_visible(self) -> bool {
        matches!(self, Status::Pending | Status::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_quota_by_subscription_status() {
        assert_eq!(Plan::from_subscription_status("active"), Plan::Pro);
        assert_eq!(Plan::from_subscription_status("inactive"), Plan::Free);
        assert_eq!(Plan::from_subscription_status("past_due"), Plan::Free);
        assert_eq!(Plan::from_subscription_status("canceled"), Plan::Free);
        assert_eq!(Plan::from_subscription_status(""), Plan::Free);
        assert_eq!(Plan::Free.message_quota(), 1);
        assert_eq!(Plan::Pro.message_quota(), 3);
    }

    #[test]
    fn status_roundtrip_and_feed_visibility() {
        for s in [
            Status::Pending,
            Status::InProgress,
            Status::Completed,
            Status::Rejected,
        ] {
            assert_eq!(Status::parse(s.as_str()), Some(s));
        }
        assert_eq!(Status::parse("deleted"), None);

        assert!(Status::Pending.is_feed_visible());
        assert!(Status::Completed.is_feed_visible());
        assert!(!Status::InProgress.is_feed_visible());
        assert!(!Status::Rejected.is_feed_visible());
    }

    #[test]
    fn category_serde_uses_kebab_case() {
        let c: Category = serde_json::from_str("\"bug-report\"").unwrap();
        assert_eq!(c, Category::BugReport);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"bug-report\"");
    }
}
