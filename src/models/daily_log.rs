use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::activity::{Activity, ActivityInput};

/// One wellbeing entry per (user, calendar day). The `(user_id, log_date)`
/// pair is unique at the schema level; `created_at` is set on first insert
/// and never touched by later edits of the same day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub message: String,
    pub mood: Mood,
    pub anxiety: i32,
    pub stress: i32,
    pub sleep_hours: f64,
    pub sleep_quality: SleepQuality,
    pub social_frequency: SocialFrequency,
    pub symptoms: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Bad,
    Terrible,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "sleep_quality", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Average,
    Good,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "social_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SocialFrequency {
    None,
    Low,
    Moderate,
    High,
}

/// A log together with its resolved activity children, as returned to the
/// client.
#[derive(Debug, Clone, Serialize)]
pub struct LogWithActivities {
    #[serde(flatten)]
    pub log: DailyLog,
    pub activities: Vec<Activity>,
}

/// POST /api/logs body. `log_date` and `activities` are optional here so
/// their absence surfaces as a validation error rather than a
/// deserialization failure.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLogRequest {
    pub log_date: Option<NaiveDate>,
    #[validate(length(max = 200, message = "Message must be at most 200 characters"))]
    pub message: String,
    pub mood: Mood,
    pub anxiety: i32,
    pub stress: i32,
    pub sleep_hours: f64,
    pub sleep_quality: SleepQuality,
    pub social_frequency: SocialFrequency,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub activities: Option<Vec<ActivityInput>>,
}

#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/logs response: total count plus the requested page.
#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub count: i64,
    pub rows: Vec<LogWithActivities>,
}
