use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A timed activity belonging to exactly one daily log. Activity rows are
/// never patched individually; the whole set is replaced on every upsert of
/// the parent log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub log_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ActivityType,
    pub duration: f64,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "activity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Exercise,
    Reading,
    Meditation,
    Work,
    Hobby,
    Walking,
    Running,
    Yoga,
    Other,
}

/// Client-supplied activity in an upsert payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub duration: f64,
}
