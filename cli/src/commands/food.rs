use anyhow::{Result, bail};
use clap::Args;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutritrack_core::models::{FoodDraft, FoodEntry, FoodGroup, MealSlot, ServingTargets};
use nutritrack_core::service::Tracker;

use super::helpers::{ServingArgs, exit_not_found, format_servings, no_neg_zero, parse_date, truncate};

/// Optional per-group replacements for `food update`.
#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct ServingOverrides {
    /// New grain servings
    #[arg(long)]
    pub grains: Option<f64>,
    /// New protein servings
    #[arg(long)]
    pub proteins: Option<f64>,
    /// New vegetable servings
    #[arg(long)]
    pub vegetables: Option<f64>,
    /// New fruit servings
    #[arg(long)]
    pub fruits: Option<f64>,
    /// New dairy servings
    #[arg(long)]
    pub dairy: Option<f64>,
    /// New oil servings
    #[arg(long)]
    pub oils: Option<f64>,
}

impl ServingOverrides {
    fn is_empty(&self) -> bool {
        FoodGroup::ALL.iter().all(|g| self.get(*g).is_none())
    }

    fn get(&self, group: FoodGroup) -> Option<f64> {
        match group {
            FoodGroup::Grains => self.grains,
            FoodGroup::Proteins => self.proteins,
            FoodGroup::Vegetables => self.vegetables,
            FoodGroup::Fruits => self.fruits,
            FoodGroup::Dairy => self.dairy,
            FoodGroup::Oils => self.oils,
        }
    }

    fn apply(&self, servings: &mut ServingTargets) {
        for &group in FoodGroup::ALL {
            if let Some(v) = self.get(group) {
                servings.set(group, v);
            }
        }
    }
}

/// Changes requested by `food update`. `None` keeps the current value.
#[derive(Debug, Default)]
pub(crate) struct FoodUpdate {
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub meal: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub servings: ServingOverrides,
}

impl FoodUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.calories.is_none()
            && self.meal.is_none()
            && self.category.is_none()
            && self.notes.is_none()
            && self.servings.is_empty()
    }

    fn merge(self, current: &FoodEntry) -> Result<FoodDraft> {
        let mut servings = current.servings;
        self.servings.apply(&mut servings);
        Ok(FoodDraft {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            calories: self.calories.unwrap_or(current.calories),
            servings,
            meal: self.meal.map_or(Ok(current.meal), |m| m.parse())?,
            category: self.category.unwrap_or_else(|| current.category.clone()),
            notes: self.notes.or_else(|| current.notes.clone()),
        })
    }
}

fn print_entry_line(verb: &str, e: &FoodEntry) {
    let cal = no_neg_zero(e.calories);
    println!(
        "{verb} {} ({cal:.0} kcal) for {} on {} [{}]",
        e.name,
        e.meal,
        e.date.format("%Y-%m-%d"),
        e.id
    );
    println!("  {}", format_servings(&e.servings));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_add(
    tracker: &mut Tracker,
    name: &str,
    calories: f64,
    servings: ServingArgs,
    meal: &str,
    category: Option<String>,
    notes: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let draft = FoodDraft {
        name: name.to_string(),
        calories,
        servings: servings.into(),
        meal: meal.parse::<MealSlot>()?,
        category: category.unwrap_or_default(),
        notes,
    };
    let entry = tracker.add_food(date, draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry_line("Logged", &entry);
    }
    Ok(())
}

pub(crate) fn cmd_food_update(
    tracker: &mut Tracker,
    id: &str,
    update: FoodUpdate,
    json: bool,
) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one field such as --calories or --name");
    }
    let Some(current) = tracker.logs().food.iter().find(|e| e.id == id) else {
        exit_not_found(&format!("Food entry {id} not found"), json);
    };
    let draft = update.merge(current)?;
    let entry = tracker.update_food(id, draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry_line("Updated", &entry);
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(tracker: &mut Tracker, id: &str, json: bool) -> Result<()> {
    if tracker.delete_food(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted food entry {id}");
        }
        Ok(())
    } else {
        exit_not_found(&format!("Food entry {id} not found"), json);
    }
}

pub(crate) fn cmd_food_list(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let mut entries: Vec<&FoodEntry> = tracker.logs().food_on(date).collect();
    entries.sort_by_key(|e| e.meal as u8);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        exit_not_found(&format!("No food entries for {}", date.format("%Y-%m-%d")), false);
    }

    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Servings")]
        servings: String,
    }

    let rows: Vec<FoodRow> = entries
        .iter()
        .map(|e| FoodRow {
            id: e.id.clone(),
            meal: e.meal.to_string(),
            name: truncate(&e.name, 30),
            calories: format!("{:.0}", no_neg_zero(e.calories)),
            servings: format_servings(&e.servings),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let total = entries.iter().fold(0.0, |acc, e| acc + e.calories);
    println!("  TOTAL: {:.0} kcal", no_neg_zero(total));
    Ok(())
}
