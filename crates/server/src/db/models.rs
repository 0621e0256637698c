use serde::{Deserialize, Serialize};

/// Account role. Users can switch between the two from their own settings,
/// so this is a property of the profile, not of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Client,
    Designer,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Client => "client",
            UserType::Designer => "designer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(UserType::Client),
            "designer" => Some(UserType::Designer),
            _ => None,
        }
    }
}

/// Project lifecycle states. The transition rules live here and every
/// mutation site goes through [`ProjectStatus::can_transition`]; the client
/// only renders state and issues transition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    PendingApproval,
    RevisionRequested,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::PendingApproval => "pending_approval",
            ProjectStatus::RevisionRequested => "revision_requested",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ProjectStatus::Open),
            "in_progress" => Some(ProjectStatus::InProgress),
            "pending_approval" => Some(ProjectStatus::PendingApproval),
            "revision_requested" => Some(ProjectStatus::RevisionRequested),
            "completed" => Some(ProjectStatus::Completed),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }

    /// Whether a project in this state counts as active work.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ProjectStatus::InProgress
                | ProjectStatus::PendingApproval
                | ProjectStatus::RevisionRequested
        )
    }

    pub fn can_transition(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;

        if next == Cancelled {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Open, InProgress)
                | (InProgress, PendingApproval)
                | (RevisionRequested, PendingApproval)
                | (PendingApproval, RevisionRequested)
                | (PendingApproval, InProgress)
                | (PendingApproval, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Deposit,
    FinalPayment,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Deposit => "deposit",
            PaymentType::FinalPayment => "final_payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(PaymentType::Deposit),
            "final_payment" => Some(PaymentType::FinalPayment),
            _ => None,
        }
    }
}

/// One row per account. `skills` is a JSON-encoded list of strings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub user_type: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub hourly_rate: Option<f64>,
    pub portfolio_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    pub fn skills_vec(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Deliverable {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub is_final_deliverable: bool,
    pub is_watermarked: bool,
    pub client_approved: bool,
    pub approved_at: Option<String>,
    pub revision_notes: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub project_id: String,
    pub sender_id: String,
    pub content: String,
    pub kind: String,
    pub image_url: Option<String>,
    pub file_name: Option<String>,
    pub is_watermarked: bool,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::ProjectStatus::*;
    use super::*;

    const ALL: [ProjectStatus; 6] = [
        Open,
        InProgress,
        PendingApproval,
        RevisionRequested,
        Completed,
        Cancelled,
    ];

    #[test]
    fn status_roundtrips_through_strings() {
        for status in ALL {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::parse("archived"), None);
    }

    #[test]
    fn legal_transitions() {
        assert!(Open.can_transition(InProgress));
        assert!(InProgress.can_transition(PendingApproval));
        assert!(RevisionRequested.can_transition(PendingApproval));
        assert!(PendingApproval.can_transition(RevisionRequested));
        assert!(PendingApproval.can_transition(InProgress));
        assert!(PendingApproval.can_transition(Completed));
    }

    #[test]
    fn cancellation_from_any_non_terminal_state() {
        for status in [Open, InProgress, PendingApproval, RevisionRequested] {
            assert!(status.can_transition(Cancelled), "{status:?}");
        }
        assert!(!Completed.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Cancelled));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for from in [Completed, Cancelled] {
            for to in ALL {
                assert!(!from.can_transition(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn illegal_shortcuts_rejected() {
        assert!(!Open.can_transition(Completed));
        assert!(!Open.can_transition(PendingApproval));
        assert!(!InProgress.can_transition(Completed));
        assert!(!RevisionRequested.can_transition(Completed));
        assert!(!InProgress.can_transition(Open));
    }

    #[test]
    fn user_and_payment_type_parsing() {
        assert_eq!(UserType::parse("designer"), Some(UserType::Designer));
        assert_eq!(UserType::parse("admin"), None);
        assert_eq!(PaymentType::parse("deposit"), Some(PaymentType::Deposit));
        assert_eq!(
            PaymentType::parse("final_payment"),
            Some(PaymentType::FinalPayment)
        );
        assert_eq!(PaymentType::parse("refund"), None);
    }

    #[test]
    fn skills_parse_from_json_column() {
        let profile = UserProfile {
            user_id: "u1".into(),
            user_type: "designer".into(),
            full_name: "Sarah Chen".into(),
            email: "sarah@example.com".into(),
            bio: Some("Brand designer".into()),
            skills: Some(r#"["Logo Design","Typography"]"#.into()),
            hourly_rate: Some(75.0),
            portfolio_url: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(profile.skills_vec(), vec!["Logo Design", "Typography"]);

        let empty = UserProfile {
            skills: None,
            ..profile
        };
        assert!(empty.skills_vec().is_empty());
    }
}
