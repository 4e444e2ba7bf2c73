//! Per-day roll-up of the logs against the active target.
//!
//! Nothing here is stored. Summaries are a pure function of the log contents
//! and the targets, so re-running them over unchanged data gives identical output.

use chrono::NaiveDate;
use serde::Serialize;

use crate::logbook::LogBook;
use crate::models::{BodyEntry, ServingTargets};
use crate::profile::Profile;

/// The goal values a day is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTargets {
    pub calories: i64,
    pub water_goal_ml: f64,
}

impl From<&Profile> for DayTargets {
    fn from(profile: &Profile) -> Self {
        Self {
            calories: profile.active_target().calories,
            water_goal_ml: profile.water_goal_ml(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub calories_in: f64,
    pub calories_burned: f64,
    /// Target calories plus calories burned.
    pub effective_budget: f64,
    /// Effective budget minus calories in. Negative means over budget.
    pub remaining: f64,
    /// Capped at 100. `None` when the effective budget is zero or negative.
    pub progress_pct: Option<f64>,
    pub serving_totals: ServingTargets,
    pub water_total_ml: f64,
    /// Capped at 100. `None` when there is no positive water goal.
    pub hydration_pct: Option<f64>,
    pub has_data: bool,
    pub is_over: bool,
    pub is_success: bool,
    pub body: Option<BodyEntry>,
    pub has_weight_entry: bool,
    pub has_exercise: bool,
}

impl DaySummary {
    /// Calories in minus calories burned, ignoring the target.
    #[must_use]
    pub fn net_calories(&self) -> f64 {
        self.calories_in - self.calories_burned
    }
}

fn capped_pct(value: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some((value / denominator * 100.0).min(100.0))
    } else {
        None
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_day(date: NaiveDate, logs: &LogBook, targets: &DayTargets) -> DaySummary {
    let mut calories_in = 0.0;
    let mut serving_totals = ServingTargets::default();
    let mut has_data = false;
    for entry in logs.food_on(date) {
        calories_in += entry.calories;
        serving_totals += entry.servings;
        has_data = true;
    }

    let mut calories_burned = 0.0;
    let mut has_exercise = false;
    for entry in logs.exercise_on(date) {
        calories_burned += entry.calories_burned;
        has_exercise = true;
    }

    let water_total_ml = logs.water_on(date).fold(0.0, |acc, e| acc + e.amount_ml);
    let body = logs.body_on(date).cloned();

    let effective_budget = targets.calories as f64 + calories_burned;
    let remaining = effective_budget - calories_in;
    let is_over = remaining < 0.0;

    DaySummary {
        date,
        calories_in,
        calories_burned,
        effective_budget,
        remaining,
        progress_pct: capped_pct(calories_in, effective_budget),
        serving_totals,
        water_total_ml,
        hydration_pct: capped_pct(water_total_ml, targets.water_goal_ml),
        has_data,
        is_over,
        is_success: has_data && !is_over,
        has_weight_entry: body.is_some(),
        body,
        has_exercise,
    }
}
