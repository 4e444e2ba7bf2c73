use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Choice enums ---

fn parse_choice<T: Copy>(
    input: &str,
    all: &[T],
    name: fn(T) -> &'static str,
    label: &str,
) -> Result<T> {
    let lower = input.trim().to_lowercase().replace('-', "_");
    if let Some(found) = all.iter().copied().find(|v| name(*v) == lower) {
        return Ok(found);
    }
    let choices: Vec<&str> = all.iter().map(|v| name(*v)).collect();
    bail!("Invalid {label} '{input}'. Must be one of: {}", choices.join(", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Male,
    Female,
    Other,
}

impl Sex {
    pub const ALL: &'static [Self] = &[Self::Male, Self::Female, Self::Other];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    #[default]
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise plus a physical job
    SuperActive,
}

impl ActivityLevel {
    pub const ALL: &'static [Self] = &[
        Self::Sedentary,
        Self::LightlyActive,
        Self::ModeratelyActive,
        Self::VeryActive,
        Self::SuperActive,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::LightlyActive => "lightly_active",
            Self::ModeratelyActive => "moderately_active",
            Self::VeryActive => "very_active",
            Self::SuperActive => "super_active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    #[default]
    LoseWeight,
    Maintain,
    GainMuscle,
}

impl Goal {
    pub const ALL: &'static [Self] = &[Self::LoseWeight, Self::Maintain, Self::GainMuscle];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoseWeight => "lose_weight",
            Self::Maintain => "maintain",
            Self::GainMuscle => "gain_muscle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietStrategy {
    #[default]
    Balanced,
    CarbCycling,
}

impl DietStrategy {
    pub const ALL: &'static [Self] = &[Self::Balanced, Self::CarbCycling];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::CarbCycling => "carb_cycling",
        }
    }
}

/// Day type under carb cycling. Ignored by the balanced strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDay {
    HighCarb,
    #[default]
    LowCarb,
}

impl CycleDay {
    pub const ALL: &'static [Self] = &[Self::HighCarb, Self::LowCarb];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighCarb => "high_carb",
            Self::LowCarb => "low_carb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    #[default]
    Auto,
    Custom,
}

impl TargetMode {
    pub const ALL: &'static [Self] = &[Self::Auto, Self::Custom];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    Snack,
}

impl MealSlot {
    pub const ALL: &'static [Self] = &[Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    #[default]
    Cardio,
    Strength,
}

impl ExerciseType {
    pub const ALL: &'static [Self] = &[Self::Cardio, Self::Strength];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cardio => "cardio",
            Self::Strength => "strength",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodGroup {
    Grains,
    Proteins,
    Vegetables,
    Fruits,
    Dairy,
    Oils,
}

impl FoodGroup {
    pub const ALL: &'static [Self] = &[
        Self::Grains,
        Self::Proteins,
        Self::Vegetables,
        Self::Fruits,
        Self::Dairy,
        Self::Oils,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grains => "grains",
            Self::Proteins => "proteins",
            Self::Vegetables => "vegetables",
            Self::Fruits => "fruits",
            Self::Dairy => "dairy",
            Self::Oils => "oils",
        }
    }
}

macro_rules! choice_traits {
    ($($ty:ident => $label:literal),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = anyhow::Error;

                fn from_str(s: &str) -> Result<Self> {
                    parse_choice(s, Self::ALL, Self::as_str, $label)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

choice_traits! {
    Sex => "sex",
    ActivityLevel => "activity level",
    Goal => "goal",
    DietStrategy => "diet strategy",
    CycleDay => "cycle day",
    TargetMode => "target mode",
    MealSlot => "meal",
    ExerciseType => "exercise type",
    FoodGroup => "food group",
}

// --- Servings and targets ---

/// Servings for each of the six food groups. Used both as a goal and as a logged total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingTargets {
    pub grains: f64,
    pub proteins: f64,
    pub vegetables: f64,
    pub fruits: f64,
    pub dairy: f64,
    pub oils: f64,
}

impl ServingTargets {
    #[must_use]
    pub fn get(&self, group: FoodGroup) -> f64 {
        match group {
            FoodGroup::Grains => self.grains,
            FoodGroup::Proteins => self.proteins,
            FoodGroup::Vegetables => self.vegetables,
            FoodGroup::Fruits => self.fruits,
            FoodGroup::Dairy => self.dairy,
            FoodGroup::Oils => self.oils,
        }
    }

    pub fn set(&mut self, group: FoodGroup, value: f64) {
        let slot = match group {
            FoodGroup::Grains => &mut self.grains,
            FoodGroup::Proteins => &mut self.proteins,
            FoodGroup::Vegetables => &mut self.vegetables,
            FoodGroup::Fruits => &mut self.fruits,
            FoodGroup::Dairy => &mut self.dairy,
            FoodGroup::Oils => &mut self.oils,
        };
        *slot = value;
    }
}

impl AddAssign for ServingTargets {
    fn add_assign(&mut self, rhs: Self) {
        for &group in FoodGroup::ALL {
            self.set(group, self.get(group) + rhs.get(group));
        }
    }
}

/// A calorie goal plus the six food-group serving goals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionTarget {
    pub calories: i64,
    pub servings: ServingTargets,
}

/// One field of a [`NutritionTarget`] that can be edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    Calories,
    Servings(FoodGroup),
}

impl NutritionTarget {
    #[must_use]
    pub fn new(calories: i64, servings: ServingTargets) -> Self {
        Self { calories, servings }
    }

    /// Write one field. Calories are rounded to whole kcal.
    pub fn set_field(&mut self, field: TargetField, value: f64) {
        match field {
            TargetField::Calories => self.calories = value.round() as i64,
            TargetField::Servings(group) => self.servings.set(group, value),
        }
    }
}

impl FromStr for TargetField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "calories" | "kcal" => Ok(Self::Calories),
            other => other
                .parse::<FoodGroup>()
                .map(Self::Servings)
                .map_err(|_| {
                    anyhow::anyhow!("Invalid target field '{s}'. Use calories or a food group")
                }),
        }
    }
}

/// Hand-entered targets for the two carb-cycling day types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleTargets {
    pub high_carb: NutritionTarget,
    pub low_carb: NutritionTarget,
}

impl CycleTargets {
    /// Fixed starting values used the first time custom carb-cycling targets are enabled.
    #[must_use]
    pub fn seed() -> Self {
        Self {
            high_carb: NutritionTarget::new(
                1800,
                ServingTargets {
                    grains: 12.0,
                    proteins: 12.0,
                    vegetables: 3.0,
                    fruits: 1.0,
                    dairy: 0.0,
                    oils: 8.5,
                },
            ),
            low_carb: NutritionTarget::new(
                1600,
                ServingTargets {
                    grains: 10.5,
                    proteins: 10.0,
                    vegetables: 3.0,
                    fruits: 1.0,
                    dairy: 0.0,
                    oils: 9.0,
                },
            ),
        }
    }

    #[must_use]
    pub fn get(&self, day: CycleDay) -> &NutritionTarget {
        match day {
            CycleDay::HighCarb => &self.high_carb,
            CycleDay::LowCarb => &self.low_carb,
        }
    }

    pub fn get_mut(&mut self, day: CycleDay) -> &mut NutritionTarget {
        match day {
            CycleDay::HighCarb => &mut self.high_carb,
            CycleDay::LowCarb => &mut self.low_carb,
        }
    }
}

// --- Log entries ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub servings: ServingTargets,
    #[serde(default)]
    pub meal: MealSlot,
    #[serde(default)]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub calories_burned: f64,
    pub duration_minutes: f64,
    #[serde(rename = "type", default)]
    pub kind: ExerciseType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterEntry {
    pub id: String,
    pub date: NaiveDate,
    pub amount_ml: f64,
}

/// Body measurement for one calendar date. At most one per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyEntry {
    pub id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body_fat_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub muscle_mass_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub waist_cm: Option<f64>,
}

/// Food entry contents without identity or date, as typed by hand or returned by an estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDraft {
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub servings: ServingTargets,
    #[serde(default)]
    pub meal: MealSlot,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub name: String,
    pub calories_burned: f64,
    pub duration_minutes: f64,
    #[serde(rename = "type", default)]
    pub kind: ExerciseType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBodyEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub waist_cm: Option<f64>,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl FoodEntry {
    #[must_use]
    pub fn from_draft(draft: FoodDraft, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            date,
            name: draft.name,
            calories: draft.calories,
            servings: draft.servings,
            meal: draft.meal,
            category: draft.category,
            notes: draft.notes,
        }
    }
}

impl ExerciseEntry {
    #[must_use]
    pub fn from_draft(draft: ExerciseDraft, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            date,
            name: draft.name,
            calories_burned: draft.calories_burned,
            duration_minutes: draft.duration_minutes,
            kind: draft.kind,
            notes: draft.notes,
        }
    }
}

// --- Validation ---

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{date}'. Must be YYYY-MM-DD"))
}

fn ensure_finite(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() {
        bail!("{field} must be a finite number");
    }
    Ok(())
}

pub fn validate_servings(servings: &ServingTargets) -> Result<()> {
    for &group in FoodGroup::ALL {
        let v = servings.get(group);
        ensure_finite(v, group.as_str())?;
        if v < 0.0 {
            bail!("{} servings must not be negative", group.as_str());
        }
    }
    Ok(())
}

pub fn validate_food_draft(draft: &FoodDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        bail!("Food name must not be empty");
    }
    ensure_finite(draft.calories, "calories")?;
    if draft.calories < 0.0 {
        bail!("calories must not be negative");
    }
    validate_servings(&draft.servings)
}

pub fn validate_exercise_draft(draft: &ExerciseDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        bail!("Exercise name must not be empty");
    }
    ensure_finite(draft.calories_burned, "calories_burned")?;
    if draft.calories_burned < 0.0 {
        bail!("calories_burned must not be negative");
    }
    ensure_finite(draft.duration_minutes, "duration_minutes")?;
    if draft.duration_minutes <= 0.0 {
        bail!("duration_minutes must be greater than 0");
    }
    Ok(())
}

pub fn validate_water_amount(amount_ml: f64) -> Result<()> {
    ensure_finite(amount_ml, "amount_ml")?;
    if amount_ml <= 0.0 {
        bail!("Water amount must be greater than 0");
    }
    Ok(())
}

pub fn validate_body_fat(body_fat_pct: Option<f64>) -> Result<()> {
    if let Some(bf) = body_fat_pct {
        ensure_finite(bf, "body_fat_pct")?;
        if !(0.0..100.0).contains(&bf) {
            bail!("body_fat_pct must be between 0 and 100");
        }
    }
    Ok(())
}

pub fn validate_body_entry(entry: &NewBodyEntry) -> Result<()> {
    ensure_finite(entry.weight_kg, "weight_kg")?;
    if entry.weight_kg <= 0.0 {
        bail!("weight_kg must be greater than 0");
    }
    validate_body_fat(entry.body_fat_pct)?;
    for (value, field) in [
        (entry.muscle_mass_kg, "muscle_mass_kg"),
        (entry.waist_cm, "waist_cm"),
    ] {
        if let Some(v) = value {
            ensure_finite(v, field)?;
            if v <= 0.0 {
                bail!("{field} must be greater than 0");
            }
        }
    }
    Ok(())
}
