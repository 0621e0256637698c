use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_designers))
}

#[derive(Debug, Deserialize)]
pub struct DesignerQuery {
    pub search: Option<String>,
    pub skill: Option<String>,
    pub rate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DesignerResponse {
    pub id: String,
    pub full_name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DesignerListResponse {
    pub designers: Vec<DesignerResponse>,
}

/// The four fixed hourly-rate buckets. Buckets are half-open so they are
/// disjoint: a designer at exactly 100 lands in `100+`, not `50-100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRange {
    Under25,
    From25To50,
    From50To100,
    Over100,
}

impl RateRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "0-25" => Some(RateRange::Under25),
            "25-50" => Some(RateRange::From25To50),
            "50-100" => Some(RateRange::From50To100),
            "100+" => Some(RateRange::Over100),
            _ => None,
        }
    }

    pub fn contains(self, rate: f64) -> bool {
        match self {
            RateRange::Under25 => (0.0..25.0).contains(&rate),
            RateRange::From25To50 => (25.0..50.0).contains(&rate),
            RateRange::From50To100 => (50.0..100.0).contains(&rate),
            RateRange::Over100 => rate >= 100.0,
        }
    }
}

fn matches_search(designer: &DesignerResponse, term: &str) -> bool {
    let term = term.to_lowercase();
    designer.full_name.to_lowercase().contains(&term)
        || designer.bio.to_lowercase().contains(&term)
        || designer
            .skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(&term))
}

fn matches_skill(designer: &DesignerResponse, skill: &str) -> bool {
    designer.skills.iter().any(|s| s == skill)
}

fn matches_rate(designer: &DesignerResponse, range: RateRange) -> bool {
    designer
        .hourly_rate
        .map(|rate| range.contains(rate))
        .unwrap_or(false)
}

/// Applies the active predicates in sequence with AND semantics; the result
/// is always a subset of the input.
fn apply_filters(
    designers: Vec<DesignerResponse>,
    search: Option<&str>,
    skill: Option<&str>,
    rate: Option<RateRange>,
) -> Vec<DesignerResponse> {
    designers
        .into_iter()
        .filter(|d| search.map_or(true, |term| matches_search(d, term)))
        .filter(|d| skill.map_or(true, |s| matches_skill(d, s)))
        .filter(|d| rate.map_or(true, |r| matches_rate(d, r)))
        .collect()
}

async fn list_designers(
    State(state): State<AppState>,
    Query(query): Query<DesignerQuery>,
) -> Result<Json<DesignerListResponse>> {
    let rate = query
        .rate
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|r| {
            RateRange::parse(r)
                .ok_or_else(|| AppError::Validation(format!("Unknown rate range: {r}")))
        })
        .transpose()?;

    // Only designer profiles with a bio and skills are discoverable
    let rows = sqlx::query_as::<_, (String, String, String, String, Option<f64>, Option<String>)>(
        r#"
        SELECT user_id, full_name, bio, skills, hourly_rate, portfolio_url
        FROM user_profiles
        WHERE user_type = 'designer' AND bio IS NOT NULL AND skills IS NOT NULL
        ORDER BY full_name ASC
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let designers = rows
        .into_iter()
        .map(
            |(id, full_name, bio, skills, hourly_rate, portfolio_url)| DesignerResponse {
                id,
                full_name,
                bio,
                skills: serde_json::from_str(&skills).unwrap_or_default(),
                hourly_rate,
                portfolio_url,
            },
        )
        // Deactivated accounts keep their row but leave discovery
        .filter(|d| !d.bio.starts_with("[DEACTIVATED]"))
        .collect();

    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    let skill = query.skill.as_deref().filter(|s| !s.is_empty());

    Ok(Json(DesignerListResponse {
        designers: apply_filters(designers, search, skill, rate),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn designer(name: &str, bio: &str, skills: &[&str], rate: f64) -> DesignerResponse {
        DesignerResponse {
            id: name.to_lowercase().replace(' ', "-"),
            full_name: name.to_string(),
            bio: bio.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            hourly_rate: Some(rate),
            portfolio_url: None,
        }
    }

    fn sample() -> Vec<DesignerResponse> {
        vec![
            designer(
                "Sarah Chen",
                "Creative brand designer helping startups build memorable identities.",
                &["Logo Design", "Brand Identity", "Typography"],
                75.0,
            ),
            designer(
                "Marcus Rodriguez",
                "UI/UX designer passionate about intuitive digital experiences.",
                &["UI/UX Design", "Web Design", "Prototyping"],
                100.0,
            ),
            designer(
                "Lisa Wang",
                "Social media design expert for consistent visual content.",
                &["Social Media Design", "Brand Identity"],
                24.0,
            ),
        ]
    }

    #[test]
    fn search_matches_name_bio_and_skills_case_insensitively() {
        let result = apply_filters(sample(), Some("sarah"), None, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].full_name, "Sarah Chen");

        // bio match
        assert_eq!(apply_filters(sample(), Some("digital"), None, None).len(), 1);
        // skill match
        assert_eq!(
            apply_filters(sample(), Some("brand identity"), None, None).len(),
            2
        );
        assert!(apply_filters(sample(), Some("motion"), None, None).is_empty());
    }

    #[test]
    fn skill_filter_requires_exact_membership() {
        let result = apply_filters(sample(), None, Some("Brand Identity"), None);
        assert_eq!(result.len(), 2);
        // Substrings do not count for the skill filter
        assert!(apply_filters(sample(), None, Some("Brand"), None).is_empty());
    }

    #[test]
    fn rate_of_exactly_100_is_only_in_the_open_ended_bucket() {
        let marcus = |r: &[DesignerResponse]| r.iter().any(|d| d.full_name == "Marcus Rodriguez");

        let over = apply_filters(sample(), None, None, Some(RateRange::Over100));
        assert!(marcus(&over));

        let mid = apply_filters(sample(), None, None, Some(RateRange::From50To100));
        assert!(!marcus(&mid));
        assert_eq!(mid.len(), 1); // Sarah at 75
    }

    #[test]
    fn rate_buckets_are_disjoint() {
        for rate in [0.0, 24.99, 25.0, 49.5, 50.0, 99.99, 100.0, 250.0] {
            let buckets = [
                RateRange::Under25,
                RateRange::From25To50,
                RateRange::From50To100,
                RateRange::Over100,
            ];
            let hits = buckets.iter().filter(|b| b.contains(rate)).count();
            assert_eq!(hits, 1, "rate {rate} matched {hits} buckets");
        }
    }

    #[test]
    fn combined_filters_use_and_semantics_and_return_a_subset() {
        let all = sample();
        let result = apply_filters(
            all.clone(),
            Some("design"),
            Some("Brand Identity"),
            Some(RateRange::From50To100),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].full_name, "Sarah Chen");
        for d in &result {
            assert!(all.iter().any(|orig| orig.id == d.id));
            assert!(matches_search(d, "design"));
            assert!(matches_skill(d, "Brand Identity"));
            assert!(matches_rate(d, RateRange::From50To100));
        }
    }

    #[test]
    fn unknown_rate_range_is_rejected_at_parse() {
        assert_eq!(RateRange::parse("0-25"), Some(RateRange::Under25));
        assert_eq!(RateRange::parse("200+"), None);
        assert_eq!(RateRange::parse(""), None);
    }
}
