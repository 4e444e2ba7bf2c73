use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutritrack_core::models::WaterEntry;
use nutritrack_core::service::Tracker;

use super::helpers::{exit_not_found, parse_date};

pub(crate) fn cmd_water_add(
    tracker: &mut Tracker,
    amount_ml: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let entry = tracker.add_water(date, amount_ml)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let summary = tracker.day_summary(date);
        println!(
            "Logged {:.0} ml on {} [{}]",
            entry.amount_ml,
            date.format("%Y-%m-%d"),
            entry.id
        );
        println!(
            "  Today: {:.0} / {:.0} ml",
            summary.water_total_ml,
            tracker.profile().water_goal_ml()
        );
    }
    Ok(())
}

pub(crate) fn cmd_water_delete(tracker: &mut Tracker, id: &str, json: bool) -> Result<()> {
    if tracker.delete_water(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted water entry {id}");
        }
        Ok(())
    } else {
        exit_not_found(&format!("Water entry {id} not found"), json);
    }
}

pub(crate) fn cmd_water_show(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct WaterDay<'a> {
        date: String,
        total_ml: f64,
        goal_ml: f64,
        hydration_pct: Option<f64>,
        entries: Vec<&'a WaterEntry>,
    }

    let date = parse_date(date)?;
    let summary = tracker.day_summary(date);
    let day = WaterDay {
        date: date.format("%Y-%m-%d").to_string(),
        total_ml: summary.water_total_ml,
        goal_ml: tracker.profile().water_goal_ml(),
        hydration_pct: summary.hydration_pct,
        entries: tracker.logs().water_on(date).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
        return Ok(());
    }

    if day.entries.is_empty() {
        exit_not_found(&format!("No water entries for {}", day.date), false);
    }

    #[derive(Tabled)]
    struct WaterRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Amount (ml)")]
        amount: String,
    }

    let rows: Vec<WaterRow> = day
        .entries
        .iter()
        .map(|e| WaterRow {
            id: e.id.clone(),
            amount: format!("{:.0}", e.amount_ml),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let pct = day
        .hydration_pct
        .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
    println!("  TOTAL: {:.0} / {:.0} ml ({pct})", day.total_ml, day.goal_ml);
    Ok(())
}
