use anyhow::Result;
use chrono::{Datelike, Local};
use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutritrack_core::aggregate::DaySummary;
use nutritrack_core::models::{FoodGroup, MealSlot, ServingTargets};
use nutritrack_core::period::{CalendarMonth, parse_month};
use nutritrack_core::service::Tracker;

use super::helpers::{fmt_servings, no_neg_zero, parse_date};

/// One calendar cell: the day number plus `ok` (within budget) or `over`,
/// then `E` when exercise was logged and `W` when a weigh-in was.
fn calendar_cell(day: &DaySummary) -> String {
    let mut cell = day.date.day().to_string();
    if day.is_success {
        cell.push_str(" ok");
    } else if day.has_data && day.is_over {
        cell.push_str(" over");
    }
    if day.has_exercise {
        cell.push_str(" E");
    }
    if day.has_weight_entry {
        cell.push_str(" W");
    }
    cell
}

/// Weeks of the month as rows of seven cells, Monday first.
fn calendar_weeks(calendar: &CalendarMonth) -> Vec<Vec<String>> {
    let mut weeks = Vec::new();
    let mut week: Vec<String> = Vec::with_capacity(7);
    if let Some(first) = calendar.days.first() {
        let offset = first.date.weekday().num_days_from_monday() as usize;
        week.resize(offset, String::new());
    }
    for day in &calendar.days {
        week.push(calendar_cell(day));
        if week.len() == 7 {
            weeks.push(std::mem::take(&mut week));
        }
    }
    if !week.is_empty() {
        week.resize(7, String::new());
        weeks.push(week);
    }
    weeks
}

fn servings_table(eaten: &ServingTargets, target: &ServingTargets) -> String {
    #[derive(Tabled)]
    struct ServingRow {
        #[tabled(rename = "Group")]
        group: &'static str,
        #[tabled(rename = "Eaten")]
        eaten: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Left")]
        left: String,
    }

    let rows: Vec<ServingRow> = FoodGroup::ALL
        .iter()
        .map(|&g| ServingRow {
            group: g.as_str(),
            eaten: fmt_servings(eaten.get(g)),
            target: fmt_servings(target.get(g)),
            left: fmt_servings(target.get(g) - eaten.get(g)),
        })
        .collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

pub(crate) fn cmd_summary(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = tracker.day_summary(date);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let logs = tracker.logs();
    println!("=== {} ===\n", date.format("%Y-%m-%d"));

    for &meal in MealSlot::ALL {
        let entries: Vec<_> = logs.food_on(date).filter(|e| e.meal == meal).collect();
        if entries.is_empty() {
            continue;
        }
        let subtotal = entries.iter().fold(0.0, |acc, e| acc + e.calories);
        println!("  {} ({subtotal:.0} kcal)", meal.as_str().to_uppercase());
        for e in entries {
            println!("    [{}] {} {:.0} kcal", e.id, e.name, e.calories);
        }
        println!();
    }

    let exercises: Vec<_> = logs.exercise_on(date).collect();
    if !exercises.is_empty() {
        println!("  EXERCISE ({:.0} kcal)", summary.calories_burned);
        for e in exercises {
            println!(
                "    [{}] {} {:.0} min {:.0} kcal",
                e.id, e.name, e.duration_minutes, e.calories_burned
            );
        }
        println!();
    }

    let target = tracker.profile().active_target();
    println!(
        "  EATEN: {:.0} kcal | BURNED: {:.0} kcal | BUDGET: {:.0} kcal",
        no_neg_zero(summary.calories_in),
        no_neg_zero(summary.calories_burned),
        summary.effective_budget
    );
    let progress = summary
        .progress_pct
        .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
    if summary.is_over {
        println!(
            "  OVER BY: {:.0} kcal ({progress})",
            -summary.remaining
        );
    } else {
        println!(
            "  REMAINING: {:.0} kcal ({progress})",
            no_neg_zero(summary.remaining)
        );
    }

    let hydration = summary
        .hydration_pct
        .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
    println!(
        "  WATER: {:.0} / {:.0} ml ({hydration})",
        summary.water_total_ml,
        tracker.profile().water_goal_ml()
    );
    if let Some(ref body) = summary.body {
        println!("  WEIGHT: {:.1} kg", body.weight_kg);
    }
    println!();
    println!("{}", servings_table(&summary.serving_totals, &target.servings));

    Ok(())
}

pub(crate) fn cmd_calendar(tracker: &Tracker, month: Option<String>, json: bool) -> Result<()> {
    let (year, month) = match month {
        Some(m) => parse_month(&m)?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    let calendar = tracker.calendar_month(year, month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&calendar)?);
        return Ok(());
    }

    println!("=== {year}-{month:02} ===\n");
    let mut builder = Builder::default();
    builder.push_record(["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    for week in calendar_weeks(&calendar) {
        builder.push_record(week);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    println!("  ok = within budget, over = over budget, E = exercise, W = weigh-in");

    let t = &calendar.totals;
    println!(
        "  Logged {} days, {} within budget | {:.0} kcal eaten, {:.0} kcal burned",
        t.days_logged, t.success_days, t.calories_in, t.calories_burned
    );
    Ok(())
}
