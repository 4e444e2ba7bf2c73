//! Body-metric formulas: Mifflin-St Jeor BMR, activity-scaled TDEE, BMI and FFMI.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, Sex};
use crate::servings::round_to;

/// Millilitres of water per kilogram of body weight for the daily hydration goal.
const WATER_ML_PER_KG: f64 = 33.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity: ActivityLevel,
    pub body_fat_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetabolicMetrics {
    pub bmr: i64,
    pub tdee: i64,
    pub bmi: f64,
    /// `None` when body fat is unknown.
    pub ffmi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 24.0 {
            Self::Normal
        } else if bmi < 27.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

#[must_use]
pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::SuperActive => 1.9,
    }
}

#[must_use]
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> i64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    let adjusted = match sex {
        Sex::Male => base + 5.0,
        Sex::Female | Sex::Other => base - 161.0,
    };
    adjusted.round() as i64
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn total_daily_energy_expenditure(bmr: i64, activity: ActivityLevel) -> i64 {
    (bmr as f64 * activity_multiplier(activity)).round() as i64
}

#[must_use]
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 1)
}

/// Fat-free mass index. Unknown body fat yields `None`, never zero.
#[must_use]
pub fn fat_free_mass_index(weight_kg: f64, height_cm: f64, body_fat_pct: Option<f64>) -> Option<f64> {
    let body_fat = body_fat_pct?;
    let height_m = height_cm / 100.0;
    let fat_free_mass = weight_kg * (1.0 - body_fat / 100.0);
    Some(round_to(fat_free_mass / (height_m * height_m), 1))
}

/// Daily water goal in ml, rounded to the nearest ml.
#[must_use]
pub fn water_goal_ml(weight_kg: f64) -> f64 {
    (weight_kg * WATER_ML_PER_KG).round()
}

#[must_use]
pub fn calculate_metrics(body: &BodyMetrics) -> MetabolicMetrics {
    let bmr = basal_metabolic_rate(body.weight_kg, body.height_cm, body.age, body.sex);
    MetabolicMetrics {
        bmr,
        tdee: total_daily_energy_expenditure(bmr, body.activity),
        bmi: body_mass_index(body.weight_kg, body.height_cm),
        ffmi: fat_free_mass_index(body.weight_kg, body.height_cm, body.body_fat_pct),
    }
}
