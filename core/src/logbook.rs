use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    BodyEntry, ExerciseDraft, ExerciseEntry, FoodDraft, FoodEntry, NewBodyEntry, WaterEntry,
    new_id, validate_body_entry, validate_exercise_draft, validate_food_draft,
    validate_water_amount,
};

/// The four log collections. Entries are identified by id and grouped by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBook {
    pub food: Vec<FoodEntry>,
    pub exercise: Vec<ExerciseEntry>,
    pub water: Vec<WaterEntry>,
    pub body: Vec<BodyEntry>,
}

fn remove_by_id<T>(entries: &mut Vec<T>, id: &str, entry_id: impl Fn(&T) -> &str) -> bool {
    let before = entries.len();
    entries.retain(|e| entry_id(e) != id);
    entries.len() != before
}

impl LogBook {
    pub fn add_food(&mut self, date: NaiveDate, draft: FoodDraft) -> Result<FoodEntry> {
        validate_food_draft(&draft)?;
        let entry = FoodEntry::from_draft(draft, date);
        self.food.push(entry.clone());
        Ok(entry)
    }

    /// Replace the contents of a food entry, keeping its id and date.
    pub fn update_food(&mut self, id: &str, draft: FoodDraft) -> Result<FoodEntry> {
        validate_food_draft(&draft)?;
        let Some(entry) = self.food.iter_mut().find(|e| e.id == id) else {
            bail!("Food entry {id} not found");
        };
        let date = entry.date;
        *entry = FoodEntry {
            id: entry.id.clone(),
            ..FoodEntry::from_draft(draft, date)
        };
        Ok(entry.clone())
    }

    pub fn delete_food(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.food, id, |e| e.id.as_str())
    }

    pub fn add_exercise(&mut self, date: NaiveDate, draft: ExerciseDraft) -> Result<ExerciseEntry> {
        validate_exercise_draft(&draft)?;
        let entry = ExerciseEntry::from_draft(draft, date);
        self.exercise.push(entry.clone());
        Ok(entry)
    }

    /// Replace the contents of an exercise entry, keeping its id and date.
    pub fn update_exercise(&mut self, id: &str, draft: ExerciseDraft) -> Result<ExerciseEntry> {
        validate_exercise_draft(&draft)?;
        let Some(entry) = self.exercise.iter_mut().find(|e| e.id == id) else {
            bail!("Exercise entry {id} not found");
        };
        let date = entry.date;
        *entry = ExerciseEntry {
            id: entry.id.clone(),
            ..ExerciseEntry::from_draft(draft, date)
        };
        Ok(entry.clone())
    }

    pub fn delete_exercise(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.exercise, id, |e| e.id.as_str())
    }

    pub fn add_water(&mut self, date: NaiveDate, amount_ml: f64) -> Result<WaterEntry> {
        validate_water_amount(amount_ml)?;
        let entry = WaterEntry {
            id: new_id(),
            date,
            amount_ml,
        };
        self.water.push(entry.clone());
        Ok(entry)
    }

    /// Remove exactly the water entry with this id. Returns false, changing
    /// nothing, when no entry matches.
    pub fn delete_water(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.water, id, |e| e.id.as_str())
    }

    /// Record a body measurement. An existing entry for the same date is replaced.
    pub fn upsert_body(&mut self, new: NewBodyEntry) -> Result<BodyEntry> {
        validate_body_entry(&new)?;
        self.body.retain(|e| e.date != new.date);
        let entry = BodyEntry {
            id: new_id(),
            date: new.date,
            weight_kg: new.weight_kg,
            body_fat_pct: new.body_fat_pct,
            muscle_mass_kg: new.muscle_mass_kg,
            waist_cm: new.waist_cm,
        };
        self.body.push(entry.clone());
        Ok(entry)
    }

    pub fn delete_body(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.body, id, |e| e.id.as_str())
    }

    pub fn food_on(&self, date: NaiveDate) -> impl Iterator<Item = &FoodEntry> {
        self.food.iter().filter(move |e| e.date == date)
    }

    pub fn exercise_on(&self, date: NaiveDate) -> impl Iterator<Item = &ExerciseEntry> {
        self.exercise.iter().filter(move |e| e.date == date)
    }

    pub fn water_on(&self, date: NaiveDate) -> impl Iterator<Item = &WaterEntry> {
        self.water.iter().filter(move |e| e.date == date)
    }

    #[must_use]
    pub fn body_on(&self, date: NaiveDate) -> Option<&BodyEntry> {
        self.body.iter().find(|e| e.date == date)
    }
}
