use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutritrack_core::models::{CycleDay, DietStrategy, FoodGroup, TargetField, TargetMode};
use nutritrack_core::profile::{CustomSlot, Profile, ProfileEdit};
use nutritrack_core::service::Tracker;

use super::helpers::{LBS_PER_KG, fmt_optional, fmt_servings, format_servings};

#[derive(Serialize)]
struct ProfileView<'a> {
    #[serde(flatten)]
    profile: &'a Profile,
    bmi_category: &'static str,
}

fn print_profile(profile: &Profile, json: bool) -> Result<()> {
    if json {
        let view = ProfileView {
            profile,
            bmi_category: profile.bmi_category().as_str(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let s = profile.settings();
    let m = profile.metrics();
    let name = &s.name;
    println!("=== {name} ===\n");
    println!(
        "  {} | {} y | {:.1} cm | {:.1} kg ({:.1} lbs)",
        s.sex,
        s.age,
        s.height_cm,
        s.weight_kg,
        s.weight_kg * LBS_PER_KG
    );
    println!(
        "  Body fat: {} | Muscle: {} | Waist: {} | Goal weight: {}",
        fmt_optional(s.body_fat_pct, "%"),
        fmt_optional(s.muscle_mass_kg, " kg"),
        fmt_optional(s.waist_cm, " cm"),
        fmt_optional(s.goal_weight_kg, " kg"),
    );
    println!(
        "  Activity: {} | Goal: {} | Strategy: {}",
        s.activity_level, s.goal, s.diet_strategy
    );
    println!();
    println!(
        "  BMR {} kcal | TDEE {} kcal | BMI {:.1} ({}) | FFMI {}",
        m.bmr,
        m.tdee,
        m.bmi,
        profile.bmi_category().as_str(),
        fmt_optional(m.ffmi, ""),
    );
    println!("  Water goal: {:.0} ml", profile.water_goal_ml());
    println!();

    print_target_line(profile);
    if let Some(ref at) = s.last_export_at {
        println!("  Last export: {at}");
    }
    Ok(())
}

fn print_target_line(profile: &Profile) {
    let s = profile.settings();
    let t = profile.active_target();
    let day = if s.diet_strategy == DietStrategy::CarbCycling {
        format!(", {}", s.cycle_day)
    } else {
        String::new()
    };
    println!("  TARGET ({}{day}): {} kcal", s.target_mode, t.calories);
    println!("  SERVINGS: {}", format_servings(&t.servings));
}

pub(crate) fn cmd_profile_show(tracker: &Tracker, json: bool) -> Result<()> {
    print_profile(tracker.profile(), json)
}

pub(crate) fn cmd_profile_set(
    tracker: &mut Tracker,
    field: &str,
    value: &str,
    json: bool,
) -> Result<()> {
    let edit = ProfileEdit::parse(field, value)?;
    let profile = tracker.edit_profile(edit)?;
    if json {
        print_profile(profile, true)
    } else {
        println!("Updated {field}");
        print_target_line(profile);
        Ok(())
    }
}

pub(crate) fn cmd_profile_mode(tracker: &mut Tracker, mode: &str, json: bool) -> Result<()> {
    let mode: TargetMode = mode.parse()?;
    let profile = tracker.set_target_mode(mode)?;
    if json {
        print_profile(profile, true)
    } else {
        println!("Target mode set to {mode}");
        print_target_line(profile);
        Ok(())
    }
}

pub(crate) fn cmd_profile_cycle(tracker: &mut Tracker, day: &str, json: bool) -> Result<()> {
    let day: CycleDay = day.parse()?;
    let profile = tracker.set_cycle_day(day)?;
    if json {
        print_profile(profile, true)
    } else {
        println!("Cycle day set to {day}");
        if profile.settings().diet_strategy == DietStrategy::Balanced {
            eprintln!("Note: the balanced strategy ignores the cycle day");
        }
        print_target_line(profile);
        Ok(())
    }
}

/// Pick the custom slot an edit writes to: an explicit cycle day, otherwise
/// whatever the current strategy reads from.
fn custom_slot(profile: &Profile, day: Option<&str>) -> Result<CustomSlot> {
    if let Some(day) = day {
        return Ok(CustomSlot::Cycle(day.parse()?));
    }
    let s = profile.settings();
    Ok(match s.diet_strategy {
        DietStrategy::Balanced => CustomSlot::Balanced,
        DietStrategy::CarbCycling => CustomSlot::Cycle(s.cycle_day),
    })
}

pub(crate) fn cmd_profile_custom(
    tracker: &mut Tracker,
    field: &str,
    value: f64,
    day: Option<&str>,
    json: bool,
) -> Result<()> {
    let field: TargetField = field.parse()?;
    let slot = custom_slot(tracker.profile(), day)?;
    let profile = tracker.set_custom_value(slot, field, value)?;

    if json {
        return print_profile(profile, true);
    }

    #[derive(Tabled)]
    struct CustomRow {
        #[tabled(rename = "Target")]
        label: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Grains")]
        grains: String,
        #[tabled(rename = "Proteins")]
        proteins: String,
        #[tabled(rename = "Vegetables")]
        vegetables: String,
        #[tabled(rename = "Fruits")]
        fruits: String,
        #[tabled(rename = "Dairy")]
        dairy: String,
        #[tabled(rename = "Oils")]
        oils: String,
    }

    let s = profile.settings();
    let mut stored = Vec::new();
    if let Some(t) = s.custom_balanced {
        stored.push(("balanced".to_string(), t));
    }
    if let Some(c) = s.custom_cycle_targets {
        for &day in CycleDay::ALL {
            stored.push((day.to_string(), *c.get(day)));
        }
    }

    let rows: Vec<CustomRow> = stored
        .into_iter()
        .map(|(label, t)| {
            let g = |group| fmt_servings(t.servings.get(group));
            CustomRow {
                label,
                calories: t.calories.to_string(),
                grains: g(FoodGroup::Grains),
                proteins: g(FoodGroup::Proteins),
                vegetables: g(FoodGroup::Vegetables),
                fruits: g(FoodGroup::Fruits),
                dairy: g(FoodGroup::Dairy),
                oils: g(FoodGroup::Oils),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    print_target_line(profile);
    Ok(())
}
