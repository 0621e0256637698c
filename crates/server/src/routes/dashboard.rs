use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    db::models::{ProjectStatus, UserType},
    error::Result,
    middleware::auth::AuthUser,
    routes::{payments::COMMISSION_RATE, projects::parse_status},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StatsResponse {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub total_earnings: f64,
}

struct ProjectStat {
    status: ProjectStatus,
    budget: f64,
    designer_id: Option<String>,
}

fn compute_stats(user_id: &str, user_type: UserType, projects: &[ProjectStat]) -> StatsResponse {
    let designer_share = (100.0 - COMMISSION_RATE) / 100.0;

    let mut stats = StatsResponse {
        total_projects: projects.len() as i64,
        ..Default::default()
    };

    for project in projects {
        if project.status.is_active() {
            stats.active_projects += 1;
        }
        if project.status == ProjectStatus::Completed {
            stats.completed_projects += 1;

            // Earnings only accrue to the designer side, net of commission
            if user_type == UserType::Designer
                && project.designer_id.as_deref() == Some(user_id)
            {
                stats.total_earnings += project.budget * designer_share;
            }
        }
    }

    stats
}

async fn get_stats(State(state): State<AppState>, user: AuthUser) -> Result<Json<StatsResponse>> {
    let user_type = sqlx::query_scalar::<_, String>(
        "SELECT user_type FROM user_profiles WHERE user_id = ?",
    )
    .bind(&user.id)
    .fetch_optional(&state.db.pool)
    .await?
    .and_then(|t| UserType::parse(&t))
    .unwrap_or(UserType::Client);

    let rows = sqlx::query_as::<_, (String, f64, Option<String>)>(
        "SELECT status, budget, designer_id FROM projects WHERE client_id = ? OR designer_id = ?",
    )
    .bind(&user.id)
    .bind(&user.id)
    .fetch_all(&state.db.pool)
    .await?;

    let mut projects = Vec::with_capacity(rows.len());
    for (status, budget, designer_id) in rows {
        projects.push(ProjectStat {
            status: parse_status(&status)?,
            budget,
            designer_id,
        });
    }

    Ok(Json(compute_stats(&user.id, user_type, &projects)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(status: ProjectStatus, budget: f64, designer_id: Option<&str>) -> ProjectStat {
        ProjectStat {
            status,
            budget,
            designer_id: designer_id.map(str::to_string),
        }
    }

    #[test]
    fn active_and_completed_counts() {
        let projects = [
            stat(ProjectStatus::Open, 100.0, None),
            stat(ProjectStatus::InProgress, 200.0, Some("d1")),
            stat(ProjectStatus::PendingApproval, 300.0, Some("d1")),
            stat(ProjectStatus::RevisionRequested, 400.0, Some("d1")),
            stat(ProjectStatus::Completed, 500.0, Some("d1")),
            stat(ProjectStatus::Cancelled, 600.0, Some("d1")),
        ];

        let stats = compute_stats("c1", UserType::Client, &projects);
        assert_eq!(stats.total_projects, 6);
        assert_eq!(stats.active_projects, 3);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.total_earnings, 0.0);
    }

    #[test]
    fn designers_earn_ninety_percent_of_their_completed_budgets() {
        let projects = [
            stat(ProjectStatus::Completed, 1000.0, Some("d1")),
            stat(ProjectStatus::Completed, 500.0, Some("d1")),
            // Completed by a different designer; counted, not earned
            stat(ProjectStatus::Completed, 900.0, Some("d2")),
            stat(ProjectStatus::InProgress, 400.0, Some("d1")),
        ];

        let stats = compute_stats("d1", UserType::Designer, &projects);
        assert_eq!(stats.completed_projects, 3);
        assert_eq!(stats.total_earnings, 1350.0);
    }

    #[test]
    fn clients_never_accrue_earnings() {
        let projects = [stat(ProjectStatus::Completed, 1000.0, Some("c1"))];
        let stats = compute_stats("c1", UserType::Client, &projects);
        assert_eq!(stats.total_earnings, 0.0);
    }
}
