use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutritrack_core::models::NewBodyEntry;
use nutritrack_core::service::Tracker;

use super::helpers::{LBS_PER_KG, exit_not_found, fmt_optional, parse_date, weight_to_kg};

/// Optional measurements recorded alongside the weight.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BodyExtras {
    pub body_fat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub waist_cm: Option<f64>,
}

pub(crate) fn cmd_body_log(
    tracker: &mut Tracker,
    value: f64,
    unit: &str,
    extras: BodyExtras,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let weight_kg = weight_to_kg(value, unit)?;
    if !unit.eq_ignore_ascii_case("kg") {
        eprintln!("Converting {value:.1} lbs to {weight_kg:.2} kg");
    }

    let entry = NewBodyEntry {
        date: parse_date(date)?,
        weight_kg,
        body_fat_pct: extras.body_fat_pct,
        muscle_mass_kg: extras.muscle_mass_kg,
        waist_cm: extras.waist_cm,
    };
    let result = tracker.log_body(entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let lbs = result.weight_kg * LBS_PER_KG;
        println!(
            "Logged {:.1} kg ({:.1} lbs) for {}",
            result.weight_kg,
            lbs,
            result.date.format("%Y-%m-%d")
        );
        if result.body_fat_pct.is_some() || result.muscle_mass_kg.is_some() || result.waist_cm.is_some()
        {
            println!(
                "  Body fat: {} | Muscle: {} | Waist: {}",
                fmt_optional(result.body_fat_pct, "%"),
                fmt_optional(result.muscle_mass_kg, " kg"),
                fmt_optional(result.waist_cm, " cm"),
            );
        }
    }

    Ok(())
}

pub(crate) fn cmd_body_show(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;

    let Some(e) = tracker.logs().body_on(date) else {
        let date_str = date.format("%Y-%m-%d");
        exit_not_found(&format!("No body entry for {date_str}"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(e)?);
    } else {
        let lbs = e.weight_kg * LBS_PER_KG;
        println!(
            "{}: {:.1} kg ({:.1} lbs)",
            e.date.format("%Y-%m-%d"),
            e.weight_kg,
            lbs
        );
        println!(
            "  Body fat: {} | Muscle: {} | Waist: {}",
            fmt_optional(e.body_fat_pct, "%"),
            fmt_optional(e.muscle_mass_kg, " kg"),
            fmt_optional(e.waist_cm, " cm"),
        );
    }

    Ok(())
}

pub(crate) fn cmd_body_history(tracker: &Tracker, limit: usize, json: bool) -> Result<()> {
    let entries = tracker.body_trend(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No body entries found. Use `nutritrack body log` to record your weight.");
    } else {
        #[derive(Tabled)]
        struct BodyRow {
            #[tabled(rename = "ID")]
            id: String,
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight (kg)")]
            kg: String,
            #[tabled(rename = "Weight (lbs)")]
            lbs: String,
            #[tabled(rename = "Body fat")]
            body_fat: String,
            #[tabled(rename = "Waist")]
            waist: String,
        }

        let rows: Vec<BodyRow> = entries
            .iter()
            .map(|e| BodyRow {
                id: e.id.clone(),
                date: e.date.format("%Y-%m-%d").to_string(),
                kg: format!("{:.1}", e.weight_kg),
                lbs: format!("{:.1}", e.weight_kg * LBS_PER_KG),
                body_fat: fmt_optional(e.body_fat_pct, "%"),
                waist: fmt_optional(e.waist_cm, " cm"),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
            .to_string();
        println!("{table}");

        if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
            let change = last.weight_kg - first.weight_kg;
            println!("  Change: {change:+.1} kg over {} entries", entries.len());
        }
    }

    Ok(())
}

pub(crate) fn cmd_body_delete(tracker: &mut Tracker, id: &str, json: bool) -> Result<()> {
    if tracker.delete_body(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted body entry {id}");
        }
        Ok(())
    } else {
        exit_not_found(&format!("Body entry {id} not found"), json);
    }
}
