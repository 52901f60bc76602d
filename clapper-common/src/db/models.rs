//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A proposed catalog item awaiting random selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Suggestion {
    pub id: i64,
    pub tenant_id: String,
    pub title: String,
    /// Movie catalog id (TMDB), unique per tenant
    pub external_ref: i64,
    pub proposer_id: String,
    pub proposer_name: String,
    /// Catalog score at proposal time (0-10)
    pub score: f64,
    pub genre_summary: String,
    pub release_year: String,
    pub proposed_at: DateTime<Utc>,
}

/// Fields supplied by the proposer; id and timestamp are assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewSuggestion {
    pub title: String,
    pub external_ref: i64,
    pub proposer_id: String,
    pub proposer_name: String,
    pub score: f64,
    pub genre_summary: String,
    pub release_year: String,
}

/// Suggestion plus its selection state, as shown by the browse views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionListing {
    pub suggestion: Suggestion,
    pub is_selected: bool,
}

/// Durable record that a suggestion was chosen and confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Selection {
    pub tenant_id: String,
    pub suggestion_id: i64,
    pub selected_at: DateTime<Utc>,
}

/// One reviewer's rating of a selected suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub tenant_id: String,
    pub suggestion_id: i64,
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub score: f64,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Review as submitted; keyed by (tenant, suggestion, reviewer) on upsert
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub suggestion_id: i64,
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub score: f64,
    pub comment: Option<String>,
}

/// Whether an upsert created a new review or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOutcome {
    Added,
    Updated,
}

impl RateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateOutcome::Added => "added",
            RateOutcome::Updated => "updated",
        }
    }
}

/// Selected suggestion with its review aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedMovie {
    pub suggestion: Suggestion,
    pub selected_at: DateTime<Utc>,
    pub average_score: f64,
    pub review_count: i64,
}

/// Per-proposer aggregate; `average_score` is 0 when `count` is 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserStats {
    pub count: i64,
    pub average_score: f64,
}

/// Output destination configured for a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub output_channel: String,
    pub configured_at: DateTime<Utc>,
}
