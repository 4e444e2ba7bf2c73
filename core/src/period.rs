//! Multi-day views built from [`summarize_day`]: calendar months, the export
//! document with its per-day rows, and the body-measurement trend.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::{DaySummary, DayTargets, summarize_day};
use crate::logbook::LogBook;
use crate::models::{BodyEntry, ExerciseEntry, FoodEntry, WaterEntry};
use crate::profile::Profile;

/// Number of body entries shown on the dashboard trend chart.
pub const BODY_TREND_LEN: usize = 14;

/// Summaries for each distinct date, in ascending date order.
pub fn summarize_period<I>(dates: I, logs: &LogBook, targets: &DayTargets) -> Vec<DaySummary>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
    dates
        .into_iter()
        .map(|date| summarize_day(date, logs, targets))
        .collect()
}

/// Every date that appears in any of the four logs.
#[must_use]
pub fn logged_dates(logs: &LogBook) -> BTreeSet<NaiveDate> {
    logs.food
        .iter()
        .map(|e| e.date)
        .chain(logs.exercise.iter().map(|e| e.date))
        .chain(logs.body.iter().map(|e| e.date))
        .chain(logs.water.iter().map(|e| e.date))
        .collect()
}

// --- Calendar ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthTotals {
    pub days_logged: usize,
    pub success_days: usize,
    pub calories_in: f64,
    pub calories_burned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DaySummary>,
    pub totals: MonthTotals,
}

/// Parse `YYYY-MM` into a year and month.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid month '{input}'. Must be YYYY-MM"))?;
    Ok((first.year(), first.month()))
}

pub fn calendar_month(
    year: i32,
    month: u32,
    logs: &LogBook,
    targets: &DayTargets,
) -> Result<CalendarMonth> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        bail!("Invalid month {year}-{month:02}");
    };
    let dates = first.iter_days().take_while(|d| d.month() == month);
    let days = summarize_period(dates, logs, targets);

    let mut totals = MonthTotals::default();
    for day in &days {
        if day.has_data {
            totals.days_logged += 1;
        }
        if day.is_success {
            totals.success_days += 1;
        }
        totals.calories_in += day.calories_in;
        totals.calories_burned += day.calories_burned;
    }

    Ok(CalendarMonth {
        year,
        month,
        days,
        totals,
    })
}

// --- Export ---

/// One row of the daily export table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDayRow {
    pub date: NaiveDate,
    pub calories_in: f64,
    pub calories_burned: f64,
    /// Calories in minus calories burned. Unlike `remaining`, the target is not involved.
    pub net_calories: f64,
    pub water_ml: f64,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub grains: f64,
    pub proteins: f64,
    pub vegetables: f64,
    pub fruits: f64,
    pub dairy: f64,
    pub oils: f64,
}

impl From<&DaySummary> for ExportDayRow {
    fn from(day: &DaySummary) -> Self {
        let s = &day.serving_totals;
        Self {
            date: day.date,
            calories_in: day.calories_in,
            calories_burned: day.calories_burned,
            net_calories: day.net_calories(),
            water_ml: day.water_total_ml,
            weight_kg: day.body.as_ref().map(|b| b.weight_kg),
            body_fat_pct: day.body.as_ref().and_then(|b| b.body_fat_pct),
            grains: s.grains,
            proteins: s.proteins,
            vegetables: s.vegetables,
            fruits: s.fruits,
            dairy: s.dairy,
            oils: s.oils,
        }
    }
}

/// Export rows for every logged date, newest first.
#[must_use]
pub fn daily_rows(logs: &LogBook, targets: &DayTargets) -> Vec<ExportDayRow> {
    let mut rows: Vec<ExportDayRow> = summarize_period(logged_dates(logs), logs, targets)
        .iter()
        .map(ExportDayRow::from)
        .collect();
    rows.reverse();
    rows
}

/// The full export payload: a profile snapshot, the raw logs and the daily rows.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub exported_at: String,
    pub profile: Profile,
    pub food_logs: Vec<FoodEntry>,
    pub exercise_logs: Vec<ExerciseEntry>,
    pub weight_logs: Vec<BodyEntry>,
    pub water_logs: Vec<WaterEntry>,
    pub daily_summary: Vec<ExportDayRow>,
}

#[must_use]
pub fn build_export(profile: &Profile, logs: &LogBook, exported_at: String) -> ExportDocument {
    let mut snapshot = profile.clone();
    snapshot.mark_exported(exported_at.clone());
    ExportDocument {
        exported_at,
        daily_summary: daily_rows(logs, &DayTargets::from(profile)),
        profile: snapshot,
        food_logs: logs.food.clone(),
        exercise_logs: logs.exercise.clone(),
        weight_logs: logs.body.clone(),
        water_logs: logs.water.clone(),
    }
}

const CSV_HEADER: [&str; 13] = [
    "date",
    "calories_in",
    "calories_burned",
    "net_calories",
    "water_ml",
    "weight_kg",
    "body_fat_pct",
    "grains",
    "proteins",
    "vegetables",
    "fruits",
    "dairy",
    "oils",
];

/// Write the daily rows as CSV with a header line. Unknown values are empty cells.
pub fn write_daily_csv<W: Write>(rows: &[ExportDayRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;
    for row in rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// --- Body trend ---

/// The most recent `limit` body entries, oldest first.
#[must_use]
pub fn body_trend(logs: &LogBook, limit: usize) -> Vec<BodyEntry> {
    let mut entries = logs.body.clone();
    entries.sort_by_key(|e| e.date);
    let skip = entries.len().saturating_sub(limit);
    entries.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ExerciseDraft, ExerciseType, FoodDraft, MealSlot, NewBodyEntry, ServingTargets,
    };

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn targets() -> DayTargets {
        DayTargets {
            calories: 2000,
            water_goal_ml: 2000.0,
        }
    }

    fn add_food(log: &mut LogBook, d: &str, calories: f64) {
        log.add_food(
            date(d),
            FoodDraft {
                name: "Bento".to_string(),
                calories,
                servings: ServingTargets {
                    grains: 2.0,
                    vegetables: 1.0,
                    ..ServingTargets::default()
                },
                meal: MealSlot::Lunch,
                category: "grains".to_string(),
                notes: None,
            },
        )
        .unwrap();
    }

    fn add_body(log: &mut LogBook, d: &str, weight_kg: f64) {
        log.upsert_body(NewBodyEntry {
            date: date(d),
            weight_kg,
            body_fat_pct: None,
            muscle_mass_kg: None,
            waist_cm: None,
        })
        .unwrap();
    }

    fn sample_logs() -> LogBook {
        let mut log = LogBook::default();
        add_food(&mut log, "2025-02-03", 1500.0);
        add_food(&mut log, "2025-02-10", 2600.0);
        log.add_exercise(
            date("2025-02-10"),
            ExerciseDraft {
                name: "Swim".to_string(),
                calories_burned: 400.0,
                duration_minutes: 40.0,
                kind: ExerciseType::Cardio,
                notes: None,
            },
        )
        .unwrap();
        log.add_water(date("2025-01-31"), 500.0).unwrap();
        add_body(&mut log, "2025-02-14", 69.8);
        log
    }

    #[test]
    fn test_summarize_period_sorted_and_deduplicated() {
        let log = sample_logs();
        let days = summarize_period(
            [date("2025-02-10"), date("2025-02-03"), date("2025-02-10")],
            &log,
            &targets(),
        );
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date("2025-02-03"));
        assert_eq!(days[1].date, date("2025-02-10"));
    }

    #[test]
    fn test_logged_dates_cover_all_logs() {
        let dates = logged_dates(&sample_logs());
        let expected: BTreeSet<NaiveDate> = ["2025-01-31", "2025-02-03", "2025-02-10", "2025-02-14"]
            .iter()
            .map(|d| date(d))
            .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_calendar_month() {
        let log = sample_logs();
        let month = calendar_month(2025, 2, &log, &targets()).unwrap();
        assert_eq!(month.days.len(), 28);
        assert_eq!(month.days[0].date, date("2025-02-01"));
        assert_eq!(month.totals.days_logged, 2);
        // 2600 in against 2000 + 400 budget is over
        assert_eq!(month.totals.success_days, 1);
        assert!((month.totals.calories_in - 4100.0).abs() < f64::EPSILON);
        assert!((month.totals.calories_burned - 400.0).abs() < f64::EPSILON);

        let d10 = &month.days[9];
        assert!(d10.has_exercise);
        assert!(!d10.has_weight_entry);
        assert!(month.days[13].has_weight_entry);
    }

    #[test]
    fn test_calendar_month_leap_year() {
        let month = calendar_month(2024, 2, &LogBook::default(), &targets()).unwrap();
        assert_eq!(month.days.len(), 29);
        assert!(calendar_month(2024, 13, &LogBook::default(), &targets()).is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-02").unwrap(), (2025, 2));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("Feb 2025").is_err());
    }

    #[test]
    fn test_daily_rows_newest_first() {
        let rows = daily_rows(&sample_logs(), &targets());
        let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2025-02-14", "2025-02-10", "2025-02-03", "2025-01-31"]);

        let feb10 = &rows[1];
        assert!((feb10.net_calories - 2200.0).abs() < f64::EPSILON);
        assert!((feb10.grains - 2.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].weight_kg, Some(69.8));
        assert_eq!(rows[0].body_fat_pct, None);
        assert!((rows[3].water_ml - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_build_export_document() {
        let log = sample_logs();
        let profile = Profile::default();
        let doc = build_export(&profile, &log, "2025-02-15T08:00:00Z".to_string());
        assert_eq!(doc.food_logs.len(), 2);
        assert_eq!(doc.weight_logs.len(), 1);
        assert_eq!(doc.daily_summary.len(), 4);
        assert_eq!(
            doc.profile.settings().last_export_at.as_deref(),
            Some("2025-02-15T08:00:00Z")
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["daily_summary"][0]["body_fat_pct"].is_null());
        assert_eq!(json["exercise_logs"][0]["type"], "cardio");
    }

    #[test]
    fn test_export_is_reproducible() {
        let log = sample_logs();
        let profile = Profile::default();
        let a = serde_json::to_string(&build_export(&profile, &log, "t".to_string())).unwrap();
        let b = serde_json::to_string(&build_export(&profile, &log, "t".to_string())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_daily_csv() {
        let rows = daily_rows(&sample_logs(), &targets());
        let mut out = Vec::new();
        write_daily_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,calories_in,calories_burned,net_calories,water_ml,weight_kg,body_fat_pct,grains,proteins,vegetables,fruits,dairy,oils"
        );
        assert!(lines.next().unwrap().starts_with("2025-02-14,0.0,0.0,0.0,0.0,69.8,,"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_write_daily_csv_empty_still_has_header() {
        let mut out = Vec::new();
        write_daily_csv(&[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("date,calories_in,"));
        assert!(text.trim_end().ends_with(",oils"));
    }

    #[test]
    fn test_body_trend_takes_latest_ascending() {
        let mut log = LogBook::default();
        for d in 1..=20 {
            add_body(&mut log, &format!("2025-03-{d:02}"), 70.0 - f64::from(d) * 0.1);
        }
        let trend = body_trend(&log, BODY_TREND_LEN);
        assert_eq!(trend.len(), 14);
        assert_eq!(trend[0].date, date("2025-03-07"));
        assert_eq!(trend[13].date, date("2025-03-20"));

        assert_eq!(body_trend(&log, 100).len(), 20);
    }
}
