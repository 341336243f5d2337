//! Daily-log persistence: the upsert-with-replace-children protocol and the
//! paginated history read.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::activity::{Activity, ActivityInput};
use crate::models::daily_log::{DailyLog, LogListResponse, LogWithActivities, UpsertLogRequest};

/// Create-or-replace a user's log for one calendar day, replacing its
/// activity set wholesale.
///
/// The log row is written with `ON CONFLICT (user_id, log_date) DO UPDATE`,
/// so two concurrent submissions for the same day cannot produce duplicate
/// rows; `created_at` survives every edit. Log fields and the activity
/// replacement commit in one transaction, so a concurrent read sees either
/// the old day or the new day, never a mix.
pub async fn upsert_log(
    db: &PgPool,
    user_id: Uuid,
    body: UpsertLogRequest,
) -> AppResult<LogWithActivities> {
    let (log_date, activities) = validate(&body)?;

    let mut tx = db.begin().await?;

    let log = sqlx::query_as::<_, DailyLog>(
        r#"
        INSERT INTO daily_logs
            (id, user_id, log_date, message, mood, anxiety, stress,
             sleep_hours, sleep_quality, social_frequency, symptoms)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id, log_date) DO UPDATE SET
            message = EXCLUDED.message,
            mood = EXCLUDED.mood,
            anxiety = EXCLUDED.anxiety,
            stress = EXCLUDED.stress,
            sleep_hours = EXCLUDED.sleep_hours,
            sleep_quality = EXCLUDED.sleep_quality,
            social_frequency = EXCLUDED.social_frequency,
            symptoms = EXCLUDED.symptoms
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(log_date)
    .bind(&body.message)
    .bind(body.mood)
    .bind(body.anxiety)
    .bind(body.stress)
    .bind(body.sleep_hours)
    .bind(body.sleep_quality)
    .bind(body.social_frequency)
    .bind(&body.symptoms)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_unique_violation)?;

    sqlx::query("DELETE FROM activities WHERE log_id = $1")
        .bind(log.id)
        .execute(&mut *tx)
        .await?;

    for activity in activities {
        sqlx::query("INSERT INTO activities (log_id, type, duration) VALUES ($1, $2, $3)")
            .bind(log.id)
            .bind(activity.kind)
            .bind(activity.duration)
            .execute(&mut *tx)
            .await?;
    }

    let stored = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE log_id = $1 ORDER BY id ASC",
    )
    .bind(log.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(LogWithActivities {
        log,
        activities: stored,
    })
}

/// Paginated log history, newest submissions first, each with its
/// activities.
pub async fn list_logs(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> AppResult<LogListResponse> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM daily_logs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;

    let logs = sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT * FROM daily_logs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let rows = attach_activities(db, logs).await?;

    Ok(LogListResponse { count, rows })
}

/// Load the activity children for a page of logs and zip them back together.
pub(crate) async fn attach_activities(
    db: &PgPool,
    logs: Vec<DailyLog>,
) -> AppResult<Vec<LogWithActivities>> {
    if logs.is_empty() {
        return Ok(vec![]);
    }

    let log_ids: Vec<Uuid> = logs.iter().map(|l| l.id).collect();
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE log_id = ANY($1) ORDER BY id ASC",
    )
    .bind(&log_ids)
    .fetch_all(db)
    .await?;

    let mut by_log: HashMap<Uuid, Vec<Activity>> = HashMap::new();
    for activity in activities {
        by_log.entry(activity.log_id).or_default().push(activity);
    }

    Ok(logs
        .into_iter()
        .map(|log| {
            let activities = by_log.remove(&log.id).unwrap_or_default();
            LogWithActivities { log, activities }
        })
        .collect())
}

/// Reject payloads the schema constraints would bounce anyway, with a client
/// error instead of a 500. Returns the resolved date and activity list.
fn validate(body: &UpsertLogRequest) -> AppResult<(NaiveDate, &[ActivityInput])> {
    let (Some(log_date), Some(activities)) = (body.log_date, body.activities.as_deref()) else {
        return Err(AppError::Validation(
            "logDate and activities[] are required".into(),
        ));
    };

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // 0 means "unrated" in the form layer and is not a storable rating.
    if !(1..=5).contains(&body.anxiety) {
        return Err(AppError::Validation("Anxiety must be between 1 and 5".into()));
    }
    if !(1..=5).contains(&body.stress) {
        return Err(AppError::Validation("Stress must be between 1 and 5".into()));
    }
    if !(0.0..=24.0).contains(&body.sleep_hours) {
        return Err(AppError::Validation(
            "Sleep hours must be between 0 and 24".into(),
        ));
    }
    for activity in activities {
        if activity.duration <= 0.0 {
            return Err(AppError::Validation(
                "Activity duration must be positive".into(),
            ));
        }
    }

    Ok((log_date, activities))
}

/// A unique violation escaping the upsert means we lost a race on
/// `(user_id, log_date)`; the caller can retry and take the update path.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A log for this date was written concurrently".into())
        }
        _ => AppError::Database(e),
    }
}
