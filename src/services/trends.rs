//! Time-bucketed trend aggregation: folds a user's raw log history into two
//! aligned, chart-ready series (per-day sleep hours and per-day activity
//! totals by type).

use std::collections::BTreeMap;

use chrono::{Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::activity::ActivityType;
use crate::models::daily_log::{DailyLog, LogWithActivities};
use crate::services::logs::attach_activities;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowKind {
    Weekly,
    Monthly,
}

impl WindowKind {
    /// Anything other than an explicit "monthly" selects the weekly window.
    pub fn from_param(view: Option<&str>) -> Self {
        match view {
            Some("monthly") => Self::Monthly,
            _ => Self::Weekly,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepPoint {
    pub date: NaiveDate,
    pub sleep_hours: f64,
}

/// One date's activity totals. Types with no activity that day are simply
/// absent; a missing key means "no data", not zero, and chart consumers
/// connect across the gap.
#[derive(Debug, Serialize, PartialEq)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub minutes: BTreeMap<ActivityType, f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TrendData {
    pub sleep: Vec<SleepPoint>,
    pub activity: Vec<ActivityPoint>,
}

/// Aggregate a user's logs over the selected window into the two trend
/// series. Read-only; a log upserted mid-query may or may not be reflected,
/// but upsert atomicity guarantees no half-written day is ever visible.
pub async fn compute_trend(
    db: &PgPool,
    user_id: Uuid,
    window: WindowKind,
) -> AppResult<TrendData> {
    let from = window_start(Utc::now().date_naive(), window);

    let logs = sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT * FROM daily_logs
        WHERE user_id = $1 AND log_date >= $2
        ORDER BY log_date ASC
        "#,
    )
    .bind(user_id)
    .bind(from)
    .fetch_all(db)
    .await?;

    let logs = attach_activities(db, logs).await?;
    Ok(build_trend(&logs))
}

/// Inclusive lower bound of the window. Weekly is a fixed 7-day
/// subtraction; monthly subtracts one calendar month (clamping to the last
/// day of shorter months), an intentional asymmetry.
pub fn window_start(today: NaiveDate, window: WindowKind) -> NaiveDate {
    match window {
        WindowKind::Weekly => today - Duration::days(7),
        WindowKind::Monthly => today
            .checked_sub_months(Months::new(1))
            .unwrap_or(today - Duration::days(30)),
    }
}

/// Fold logs (already ascending by date) into the two series.
///
/// Logs are bucketed by their own `log_date`, not by any server-side clock.
/// The upsert invariant normally yields one log per bucket, so bucketing is
/// a defensive layer: should historical duplicates exist, the first log in
/// encountered order supplies the sleep figure and every log contributes to
/// the activity sums.
pub fn build_trend(logs: &[LogWithActivities]) -> TrendData {
    let mut buckets: BTreeMap<NaiveDate, Vec<&LogWithActivities>> = BTreeMap::new();
    for entry in logs {
        buckets.entry(entry.log.log_date).or_default().push(entry);
    }

    let mut trend = TrendData {
        sleep: Vec::with_capacity(buckets.len()),
        activity: Vec::with_capacity(buckets.len()),
    };

    for (date, bucket) in buckets {
        let sleep_hours = round_tenth(bucket[0].log.sleep_hours);

        let mut minutes: BTreeMap<ActivityType, f64> = BTreeMap::new();
        for entry in &bucket {
            for activity in &entry.activities {
                *minutes.entry(activity.kind).or_insert(0.0) += activity.duration;
            }
        }

        trend.sleep.push(SleepPoint { date, sleep_hours });
        trend.activity.push(ActivityPoint { date, minutes });
    }

    trend
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::Activity;
    use crate::models::daily_log::{Mood, SleepQuality, SocialFrequency};

    fn log_for(date: &str, sleep_hours: f64, activities: &[(ActivityType, f64)]) -> LogWithActivities {
        let log_id = Uuid::new_v4();
        LogWithActivities {
            log: DailyLog {
                id: log_id,
                user_id: Uuid::new_v4(),
                log_date: date.parse().unwrap(),
                message: String::new(),
                mood: Mood::Neutral,
                anxiety: 3,
                stress: 3,
                sleep_hours,
                sleep_quality: SleepQuality::Average,
                social_frequency: SocialFrequency::Low,
                symptoms: vec![],
                created_at: Utc::now(),
            },
            activities: activities
                .iter()
                .enumerate()
                .map(|(i, &(kind, duration))| Activity {
                    id: i as i64 + 1,
                    log_id,
                    kind,
                    duration,
                })
                .collect(),
        }
    }

    // ── window selection ─────────────────────────────────────────────────

    #[test]
    fn test_window_kind_defaults_to_weekly() {
        assert_eq!(WindowKind::from_param(None), WindowKind::Weekly);
        assert_eq!(WindowKind::from_param(Some("weekly")), WindowKind::Weekly);
        assert_eq!(WindowKind::from_param(Some("yearly")), WindowKind::Weekly);
        assert_eq!(WindowKind::from_param(Some("monthly")), WindowKind::Monthly);
    }

    #[test]
    fn test_weekly_boundary_is_inclusive_at_seven_days() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        let from = window_start(today, WindowKind::Weekly);
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        // log_date >= from: exactly 7 days back is in, 8 days back is out
        let seven_back = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let eight_back = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        assert!(seven_back >= from);
        assert!(eight_back < from);
    }

    #[test]
    fn test_monthly_window_subtracts_a_calendar_month() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(
            window_start(today, WindowKind::Monthly),
            NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
        );
    }

    #[test]
    fn test_monthly_window_clamps_to_month_end() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            window_start(today, WindowKind::Monthly),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    // ── folding ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_window_yields_empty_series() {
        let trend = build_trend(&[]);
        assert!(trend.sleep.is_empty());
        assert!(trend.activity.is_empty());
    }

    #[test]
    fn test_same_type_durations_sum_within_a_day() {
        let logs = vec![log_for(
            "2024-05-01",
            7.0,
            &[(ActivityType::Exercise, 20.0), (ActivityType::Exercise, 25.0)],
        )];
        let trend = build_trend(&logs);
        assert_eq!(trend.activity[0].minutes[&ActivityType::Exercise], 45.0);
    }

    #[test]
    fn test_absent_types_are_omitted_not_zero_filled() {
        let logs = vec![log_for("2024-05-01", 7.0, &[(ActivityType::Reading, 15.0)])];
        let trend = build_trend(&logs);

        let json = serde_json::to_value(&trend.activity[0]).unwrap();
        assert_eq!(json["reading"], 15.0);
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json.as_object().unwrap().len(), 2, "only date and reading");
    }

    #[test]
    fn test_log_without_activities_keeps_its_sleep_point() {
        let logs = vec![log_for("2024-05-01", 6.25, &[])];
        let trend = build_trend(&logs);

        assert_eq!(trend.sleep.len(), 1);
        assert_eq!(trend.activity.len(), 1);
        assert!(trend.activity[0].minutes.is_empty());
    }

    #[test]
    fn test_sleep_hours_round_to_one_decimal() {
        let logs = vec![log_for("2024-05-01", 7.46, &[])];
        let trend = build_trend(&logs);
        assert_eq!(trend.sleep[0].sleep_hours, 7.5);
    }

    #[test]
    fn test_duplicate_date_bucket_takes_first_sleep_and_sums_activities() {
        // The uniqueness invariant should prevent this shape, but historical
        // duplicates get bucketed rather than rejected.
        let logs = vec![
            log_for("2024-05-01", 8.0, &[(ActivityType::Walking, 10.0)]),
            log_for("2024-05-01", 5.0, &[(ActivityType::Walking, 30.0)]),
        ];
        let trend = build_trend(&logs);

        assert_eq!(trend.sleep.len(), 1);
        assert_eq!(trend.sleep[0].sleep_hours, 8.0);
        assert_eq!(trend.activity[0].minutes[&ActivityType::Walking], 40.0);
    }

    #[test]
    fn test_series_ascend_by_date() {
        let logs = vec![
            log_for("2024-05-01", 7.0, &[]),
            log_for("2024-05-03", 6.0, &[]),
            log_for("2024-05-02", 8.0, &[]),
        ];
        let trend = build_trend(&logs);
        let dates: Vec<String> = trend.sleep.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn test_resubmitted_day_reflects_only_latest_payload() {
        // After an upsert replaces the day (sleep 7.5 / exercise 30 became
        // sleep 6.0 / yoga 20+10), only the replacement is visible.
        let logs = vec![log_for(
            "2024-05-01",
            6.0,
            &[(ActivityType::Yoga, 20.0), (ActivityType::Yoga, 10.0)],
        )];
        let trend = build_trend(&logs);

        assert_eq!(
            trend.sleep[0],
            SleepPoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                sleep_hours: 6.0,
            }
        );
        let json = serde_json::to_value(&trend.activity[0]).unwrap();
        assert_eq!(json["yoga"], 30.0);
        assert!(json.get("exercise").is_none());
    }
}
