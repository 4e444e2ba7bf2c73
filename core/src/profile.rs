//! The person's profile and the resolution of their active nutrition target.
//!
//! A [`Profile`] owns the user-editable [`ProfileSettings`] plus two derived
//! values: the cached [`MetabolicMetrics`] and the active [`NutritionTarget`].
//! The derived values are recomputed from the settings after every edit and on
//! load; there is no way to write them directly.
//!
//! Target mode works as a two-state machine:
//!
//! - `Auto`: the active target is the strategy adjuster's output for the
//!   current TDEE, goal, strategy and cycle day.
//! - `Custom`: the active target is read from the stored hand-entered values,
//!   either the per-cycle-day table (carb cycling) or the single balanced
//!   target. Body-metric edits still refresh the metrics but never touch the
//!   stored values.

use std::ops::RangeInclusive;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metabolic::{
    BmiCategory, BodyMetrics, MetabolicMetrics, calculate_metrics, water_goal_ml,
};
use crate::models::{
    ActivityLevel, CycleDay, CycleTargets, DietStrategy, FoodGroup, Goal, NutritionTarget, Sex,
    TargetField, TargetMode, validate_body_fat,
};
use crate::strategy::adjust_for_strategy;

pub const DEFAULT_WATER_GOAL_ML: f64 = 2300.0;

// Together these keep BMR above zero at every corner (lightest, shortest,
// oldest, female gives about 164 kcal).
pub const AGE_RANGE: RangeInclusive<u32> = 13..=120;
pub const HEIGHT_CM_RANGE: RangeInclusive<f64> = 100.0..=250.0;
pub const WEIGHT_KG_RANGE: RangeInclusive<f64> = 30.0..=350.0;

/// Everything about the profile that a user can edit. Missing fields in stored
/// JSON fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub name: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub goal_weight_kg: Option<f64>,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub diet_strategy: DietStrategy,
    pub cycle_day: CycleDay,
    pub target_mode: TargetMode,
    /// Hand-entered target used in custom mode with the balanced strategy.
    pub custom_balanced: Option<NutritionTarget>,
    /// Hand-entered per-cycle-day targets used in custom mode with carb cycling.
    pub custom_cycle_targets: Option<CycleTargets>,
    pub water_goal_ml: f64,
    pub last_export_at: Option<String>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            age: 30,
            height_cm: 170.0,
            weight_kg: 70.0,
            body_fat_pct: Some(20.0),
            muscle_mass_kg: None,
            waist_cm: None,
            goal_weight_kg: Some(65.0),
            sex: Sex::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            goal: Goal::LoseWeight,
            diet_strategy: DietStrategy::Balanced,
            cycle_day: CycleDay::LowCarb,
            target_mode: TargetMode::Auto,
            custom_balanced: None,
            custom_cycle_targets: None,
            water_goal_ml: DEFAULT_WATER_GOAL_ML,
            last_export_at: None,
        }
    }
}

impl ProfileSettings {
    #[must_use]
    pub fn body_metrics(&self) -> BodyMetrics {
        BodyMetrics {
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            age: self.age,
            sex: self.sex,
            activity: self.activity_level,
            body_fat_pct: self.body_fat_pct,
        }
    }

    /// The target the strategy adjuster produces for these settings, whatever the mode.
    #[must_use]
    pub fn auto_target(&self, tdee: i64) -> NutritionTarget {
        adjust_for_strategy(tdee, self.diet_strategy, self.cycle_day, self.goal)
    }
}

fn ensure_positive(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{field} must be a positive number");
    }
    Ok(())
}

fn ensure_in_range(value: f64, range: &RangeInclusive<f64>, field: &str) -> Result<()> {
    if !value.is_finite() || !range.contains(&value) {
        bail!(
            "{field} must be between {} and {}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}

fn ensure_optional_positive(value: Option<f64>, field: &str) -> Result<()> {
    value.map_or(Ok(()), |v| ensure_positive(v, field))
}

/// Reject settings whose numbers would make the metabolic formulas meaningless.
pub fn validate_profile_settings(settings: &ProfileSettings) -> Result<()> {
    if !AGE_RANGE.contains(&settings.age) {
        bail!(
            "age must be between {} and {}",
            AGE_RANGE.start(),
            AGE_RANGE.end()
        );
    }
    ensure_in_range(settings.height_cm, &HEIGHT_CM_RANGE, "height_cm")?;
    ensure_in_range(settings.weight_kg, &WEIGHT_KG_RANGE, "weight_kg")?;
    validate_body_fat(settings.body_fat_pct)?;
    ensure_optional_positive(settings.muscle_mass_kg, "muscle_mass_kg")?;
    ensure_optional_positive(settings.waist_cm, "waist_cm")?;
    ensure_optional_positive(settings.goal_weight_kg, "goal_weight_kg")?;
    ensure_positive(settings.water_goal_ml, "water_goal_ml")?;
    Ok(())
}

/// A single profile edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEdit {
    Name(String),
    Age(u32),
    HeightCm(f64),
    WeightKg(f64),
    BodyFatPct(Option<f64>),
    MuscleMassKg(Option<f64>),
    WaistCm(Option<f64>),
    GoalWeightKg(Option<f64>),
    Sex(Sex),
    Activity(ActivityLevel),
    Goal(Goal),
    Strategy(DietStrategy),
    WaterGoalMl(f64),
}

fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow::anyhow!("Invalid {field} '{value}'. Must be a number"))
}

fn parse_optional_number(field: &str, value: &str) -> Result<Option<f64>> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" | "unknown" | "-" => Ok(None),
        _ => parse_number(field, value).map(Some),
    }
}

impl ProfileEdit {
    pub const FIELDS: &'static [&'static str] = &[
        "name",
        "age",
        "height",
        "weight",
        "body-fat",
        "muscle-mass",
        "waist",
        "goal-weight",
        "sex",
        "activity",
        "goal",
        "strategy",
        "water-goal",
    ];

    /// Build an edit from a field name and a textual value. Optional fields
    /// accept `none` to clear them.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let key = field.trim().to_lowercase().replace('_', "-");
        let edit = match key.as_str() {
            "name" => Self::Name(value.trim().to_string()),
            "age" => Self::Age(
                value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid age '{value}'. Must be a whole number"))?,
            ),
            "height" | "height-cm" => Self::HeightCm(parse_number("height", value)?),
            "weight" | "weight-kg" => Self::WeightKg(parse_number("weight", value)?),
            "body-fat" | "body-fat-pct" => Self::BodyFatPct(parse_optional_number("body fat", value)?),
            "muscle-mass" | "muscle-mass-kg" => {
                Self::MuscleMassKg(parse_optional_number("muscle mass", value)?)
            }
            "waist" | "waist-cm" => Self::WaistCm(parse_optional_number("waist", value)?),
            "goal-weight" | "goal-weight-kg" => {
                Self::GoalWeightKg(parse_optional_number("goal weight", value)?)
            }
            "sex" => Self::Sex(value.parse()?),
            "activity" | "activity-level" => Self::Activity(value.parse()?),
            "goal" => Self::Goal(value.parse()?),
            "strategy" | "diet-strategy" => Self::Strategy(value.parse()?),
            "water-goal" | "water-goal-ml" => Self::WaterGoalMl(parse_number("water goal", value)?),
            _ => bail!(
                "Unknown profile field '{field}'. Must be one of: {}",
                Self::FIELDS.join(", ")
            ),
        };
        Ok(edit)
    }

    /// Edits that change the body metrics the calculator reads.
    fn affects_body_metrics(&self) -> bool {
        matches!(
            self,
            Self::Age(_)
                | Self::HeightCm(_)
                | Self::WeightKg(_)
                | Self::BodyFatPct(_)
                | Self::Sex(_)
                | Self::Activity(_)
        )
    }
}

/// Which stored custom target a hand edit writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomSlot {
    Balanced,
    Cycle(CycleDay),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileSettings")]
pub struct Profile {
    #[serde(flatten)]
    settings: ProfileSettings,
    metrics: MetabolicMetrics,
    active_target: NutritionTarget,
}

impl Default for Profile {
    fn default() -> Self {
        Self::from(ProfileSettings::default())
    }
}

impl From<ProfileSettings> for Profile {
    fn from(settings: ProfileSettings) -> Self {
        let mut profile = Self {
            settings,
            metrics: MetabolicMetrics::default(),
            active_target: NutritionTarget::default(),
        };
        if profile.settings.target_mode == TargetMode::Custom {
            profile.seed_custom_targets();
        }
        profile.refresh();
        profile
    }
}

impl Profile {
    #[must_use]
    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    #[must_use]
    pub fn metrics(&self) -> &MetabolicMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn active_target(&self) -> &NutritionTarget {
        &self.active_target
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.metrics.bmi)
    }

    #[must_use]
    pub fn water_goal_ml(&self) -> f64 {
        self.settings.water_goal_ml
    }

    /// Recompute the cached metrics and the active target from the settings.
    fn refresh(&mut self) {
        self.metrics = calculate_metrics(&self.settings.body_metrics());
        self.active_target = self.resolve_target();
        debug!(
            mode = self.settings.target_mode.as_str(),
            strategy = self.settings.diet_strategy.as_str(),
            cycle_day = self.settings.cycle_day.as_str(),
            tdee = self.metrics.tdee,
            calories = self.active_target.calories,
            "recomputed active target"
        );
    }

    fn resolve_target(&self) -> NutritionTarget {
        let s = &self.settings;
        let auto = || s.auto_target(self.metrics.tdee);
        match (s.target_mode, s.diet_strategy) {
            (TargetMode::Auto, _) => auto(),
            (TargetMode::Custom, DietStrategy::CarbCycling) => s
                .custom_cycle_targets
                .map_or_else(|| *CycleTargets::seed().get(s.cycle_day), |t| *t.get(s.cycle_day)),
            (TargetMode::Custom, DietStrategy::Balanced) => s.custom_balanced.unwrap_or_else(auto),
        }
    }

    /// Fill in whichever custom table the current strategy reads, if missing.
    /// Existing tables are never replaced.
    fn seed_custom_targets(&mut self) {
        match self.settings.diet_strategy {
            DietStrategy::CarbCycling => {
                self.settings
                    .custom_cycle_targets
                    .get_or_insert_with(CycleTargets::seed);
            }
            DietStrategy::Balanced => {
                if self.settings.custom_balanced.is_none() {
                    let tdee = calculate_metrics(&self.settings.body_metrics()).tdee;
                    self.settings.custom_balanced = Some(self.settings.auto_target(tdee));
                }
            }
        }
    }

    /// Apply one edit, then recompute derived values.
    ///
    /// In auto mode a body-metric edit also re-derives the water goal from the
    /// new weight. In custom mode only the metrics change; stored custom
    /// targets are left as they are.
    pub fn apply(&mut self, edit: ProfileEdit) -> Result<()> {
        let mut next = self.settings.clone();
        let rederive_water =
            edit.affects_body_metrics() && next.target_mode == TargetMode::Auto;
        match edit {
            ProfileEdit::Name(name) => {
                if name.is_empty() {
                    bail!("Name must not be empty");
                }
                next.name = name;
            }
            ProfileEdit::Age(age) => next.age = age,
            ProfileEdit::HeightCm(v) => next.height_cm = v,
            ProfileEdit::WeightKg(v) => next.weight_kg = v,
            ProfileEdit::BodyFatPct(v) => next.body_fat_pct = v,
            ProfileEdit::MuscleMassKg(v) => next.muscle_mass_kg = v,
            ProfileEdit::WaistCm(v) => next.waist_cm = v,
            ProfileEdit::GoalWeightKg(v) => next.goal_weight_kg = v,
            ProfileEdit::Sex(v) => next.sex = v,
            ProfileEdit::Activity(v) => next.activity_level = v,
            ProfileEdit::Goal(v) => next.goal = v,
            ProfileEdit::Strategy(v) => next.diet_strategy = v,
            ProfileEdit::WaterGoalMl(v) => next.water_goal_ml = v,
        }
        if rederive_water {
            next.water_goal_ml = water_goal_ml(next.weight_kg);
        }
        validate_profile_settings(&next)?;

        self.settings = next;
        if self.settings.target_mode == TargetMode::Custom {
            self.seed_custom_targets();
        }
        self.refresh();
        Ok(())
    }

    /// Switch between auto and custom targets.
    ///
    /// Entering custom mode seeds the custom table the current strategy reads
    /// (fixed defaults for carb cycling, the current auto target for balanced)
    /// when none is stored yet. Leaving it keeps the stored tables.
    pub fn set_target_mode(&mut self, mode: TargetMode) {
        if mode == TargetMode::Custom && self.settings.target_mode == TargetMode::Auto {
            self.seed_custom_targets();
        }
        self.settings.target_mode = mode;
        self.refresh();
    }

    pub fn set_cycle_day(&mut self, day: CycleDay) {
        self.settings.cycle_day = day;
        self.refresh();
    }

    /// Write one hand-entered value. When the slot is the one the active
    /// target is read from, the edit shows up in the active target at once.
    pub fn set_custom_value(&mut self, slot: CustomSlot, field: TargetField, value: f64) -> Result<()> {
        if self.settings.target_mode != TargetMode::Custom {
            bail!("Custom targets can only be edited in custom mode. Run `profile mode custom` first");
        }
        if !value.is_finite() {
            bail!("Target value must be a finite number");
        }
        if matches!(field, TargetField::Servings(_)) && value < 0.0 {
            bail!("Servings must not be negative");
        }

        let fallback = self.active_target;
        let target = match slot {
            CustomSlot::Balanced => self.settings.custom_balanced.get_or_insert(fallback),
            CustomSlot::Cycle(day) => self
                .settings
                .custom_cycle_targets
                .get_or_insert_with(CycleTargets::seed)
                .get_mut(day),
        };
        target.set_field(field, value);
        self.refresh();
        Ok(())
    }

    /// Replace every serving of one custom slot in a single step.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_custom_target(&mut self, slot: CustomSlot, target: NutritionTarget) -> Result<()> {
        self.set_custom_value(slot, TargetField::Calories, target.calories as f64)?;
        for &group in FoodGroup::ALL {
            self.set_custom_value(slot, TargetField::Servings(group), target.servings.get(group))?;
        }
        Ok(())
    }

    pub fn mark_exported(&mut self, at: String) {
        self.settings.last_export_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServingTargets;

    fn profile_with(strategy: DietStrategy, goal: Goal) -> Profile {
        let mut p = Profile::default();
        p.apply(ProfileEdit::Strategy(strategy)).unwrap();
        p.apply(ProfileEdit::Goal(goal)).unwrap();
        p
    }

    #[test]
    fn test_default_profile_is_resolved() {
        let p = Profile::default();
        assert_eq!(p.metrics().bmr, 1618);
        assert_eq!(p.metrics().tdee, 2508);
        assert_eq!(p.metrics().ffmi, Some(19.4));
        // 2508 * 0.85 = 2131.8
        assert_eq!(p.active_target().calories, 2132);
        assert!((p.water_goal_ml() - DEFAULT_WATER_GOAL_ML).abs() < f64::EPSILON);
    }

    #[test]
    fn test_auto_edit_rederives_everything() {
        let mut p = Profile::default();
        let before = *p.active_target();
        p.apply(ProfileEdit::WeightKg(90.0)).unwrap();
        assert_eq!(p.metrics().bmr, 1818);
        assert!(p.active_target().calories > before.calories);
        assert!((p.water_goal_ml() - 2970.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_body_fat_gives_unknown_ffmi() {
        let mut p = Profile::default();
        p.apply(ProfileEdit::BodyFatPct(None)).unwrap();
        assert_eq!(p.metrics().ffmi, None);
    }

    #[test]
    fn test_invalid_edit_leaves_profile_untouched() {
        let mut p = Profile::default();
        let before = p.clone();
        assert!(p.apply(ProfileEdit::HeightCm(0.0)).is_err());
        assert!(p.apply(ProfileEdit::WeightKg(f64::NAN)).is_err());
        assert!(p.apply(ProfileEdit::BodyFatPct(Some(120.0))).is_err());
        assert!(p.apply(ProfileEdit::Age(0)).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn test_tiny_body_rejected() {
        let mut p = Profile::default();
        p.apply(ProfileEdit::Sex(Sex::Female)).unwrap();
        assert!(p.apply(ProfileEdit::WeightKg(5.0)).is_err());
        assert!(p.apply(ProfileEdit::HeightCm(50.0)).is_err());
        assert!(p.apply(ProfileEdit::Age(151)).is_err());
        assert!(p.apply(ProfileEdit::WeightKg(400.0)).is_err());
    }

    #[test]
    fn test_bmr_positive_across_accepted_ranges() {
        let ages = [*AGE_RANGE.start(), 30, *AGE_RANGE.end()];
        let heights = [*HEIGHT_CM_RANGE.start(), 170.0, *HEIGHT_CM_RANGE.end()];
        let weights = [*WEIGHT_KG_RANGE.start(), 70.0, *WEIGHT_KG_RANGE.end()];
        for sex in [Sex::Male, Sex::Female] {
            for &age in &ages {
                for &height_cm in &heights {
                    for &weight_kg in &weights {
                        let settings = ProfileSettings {
                            sex,
                            age,
                            height_cm,
                            weight_kg,
                            ..ProfileSettings::default()
                        };
                        validate_profile_settings(&settings).unwrap();
                        let p = Profile::from(settings);
                        let m = p.metrics();
                        assert!(m.bmr > 0, "bmr {} for {age}/{height_cm}/{weight_kg}", m.bmr);
                        assert!(m.tdee >= m.bmr);
                    }
                }
            }
        }
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let a = profile_with(DietStrategy::CarbCycling, Goal::GainMuscle);
        let b = profile_with(DietStrategy::CarbCycling, Goal::GainMuscle);
        assert_eq!(a.active_target(), b.active_target());
        assert_eq!(a.metrics(), b.metrics());
    }

    #[test]
    fn test_cycle_day_round_trip_in_auto() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        p.set_cycle_day(CycleDay::HighCarb);
        let original = *p.active_target();
        p.set_cycle_day(CycleDay::LowCarb);
        assert_ne!(*p.active_target(), original);
        p.set_cycle_day(CycleDay::HighCarb);
        assert_eq!(*p.active_target(), original);
    }

    #[test]
    fn test_enter_custom_seeds_cycle_table() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        assert!(p.settings().custom_cycle_targets.is_none());
        p.set_target_mode(TargetMode::Custom);
        assert_eq!(p.settings().custom_cycle_targets, Some(CycleTargets::seed()));
        assert_eq!(p.active_target().calories, 1600);
        p.set_cycle_day(CycleDay::HighCarb);
        assert_eq!(p.active_target().calories, 1800);
    }

    #[test]
    fn test_enter_custom_balanced_keeps_current_target() {
        let mut p = Profile::default();
        let auto = *p.active_target();
        p.set_target_mode(TargetMode::Custom);
        assert_eq!(*p.active_target(), auto);
        assert_eq!(p.settings().custom_balanced, Some(auto));
    }

    #[test]
    fn test_custom_table_survives_auto_excursion() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        p.set_target_mode(TargetMode::Custom);
        p.set_custom_value(CustomSlot::Cycle(CycleDay::HighCarb), TargetField::Calories, 2000.0)
            .unwrap();
        let table = p.settings().custom_cycle_targets;

        p.set_target_mode(TargetMode::Auto);
        assert_eq!(p.active_target().calories, 1881);
        p.set_target_mode(TargetMode::Custom);
        assert_eq!(p.settings().custom_cycle_targets, table);
        assert_eq!(p.active_target().calories, 1600);
    }

    #[test]
    fn test_edit_active_day_mirrors_into_active_target() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        p.set_target_mode(TargetMode::Custom);
        p.set_custom_value(
            CustomSlot::Cycle(CycleDay::LowCarb),
            TargetField::Servings(FoodGroup::Proteins),
            11.5,
        )
        .unwrap();
        assert!((p.active_target().servings.proteins - 11.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_edit_inactive_day_leaves_active_target() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        p.set_target_mode(TargetMode::Custom);
        let before = *p.active_target();
        p.set_custom_value(
            CustomSlot::Cycle(CycleDay::HighCarb),
            TargetField::Servings(FoodGroup::Grains),
            2.0,
        )
        .unwrap();
        assert_eq!(*p.active_target(), before);
        let stored = p.settings().custom_cycle_targets.unwrap();
        assert!((stored.high_carb.servings.grains - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_mode_metric_edit_keeps_target() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::LoseWeight);
        p.set_target_mode(TargetMode::Custom);
        let target = *p.active_target();
        let table = p.settings().custom_cycle_targets;
        let water = p.water_goal_ml();

        p.apply(ProfileEdit::WeightKg(80.0)).unwrap();
        p.apply(ProfileEdit::Activity(ActivityLevel::VeryActive)).unwrap();
        assert_eq!(*p.active_target(), target);
        assert_eq!(p.settings().custom_cycle_targets, table);
        assert!((p.water_goal_ml() - water).abs() < f64::EPSILON);
        // 800 + 1062.5 - 150 + 5
        assert_eq!(p.metrics().bmr, 1718);
    }

    #[test]
    fn test_custom_strategy_switch_reads_stored_values() {
        let mut p = Profile::default();
        p.set_target_mode(TargetMode::Custom);
        let balanced = *p.active_target();
        p.apply(ProfileEdit::Strategy(DietStrategy::CarbCycling)).unwrap();
        assert_eq!(*p.active_target(), *CycleTargets::seed().get(CycleDay::LowCarb));
        p.apply(ProfileEdit::Strategy(DietStrategy::Balanced)).unwrap();
        assert_eq!(*p.active_target(), balanced);
    }

    #[test]
    fn test_custom_edit_requires_custom_mode() {
        let mut p = Profile::default();
        let err = p
            .set_custom_value(CustomSlot::Balanced, TargetField::Calories, 1800.0)
            .unwrap_err();
        assert!(err.to_string().contains("custom mode"));
    }

    #[test]
    fn test_custom_negative_servings_rejected() {
        let mut p = Profile::default();
        p.set_target_mode(TargetMode::Custom);
        assert!(p
            .set_custom_value(CustomSlot::Balanced, TargetField::Servings(FoodGroup::Dairy), -1.0)
            .is_err());
        // a negative calorie plan is allowed; downstream percentages guard it
        p.set_custom_value(CustomSlot::Balanced, TargetField::Calories, -200.0).unwrap();
        assert_eq!(p.active_target().calories, -200);
    }

    #[test]
    fn test_set_custom_target_replaces_slot() {
        let mut p = Profile::default();
        p.set_target_mode(TargetMode::Custom);
        let plan = NutritionTarget::new(
            1700,
            ServingTargets {
                grains: 3.0,
                proteins: 5.0,
                vegetables: 4.0,
                fruits: 2.0,
                dairy: 1.0,
                oils: 4.0,
            },
        );
        p.set_custom_target(CustomSlot::Balanced, plan).unwrap();
        assert_eq!(*p.active_target(), plan);
    }

    #[test]
    fn test_serde_recomputes_derived_fields() {
        let mut p = profile_with(DietStrategy::CarbCycling, Goal::GainMuscle);
        p.set_target_mode(TargetMode::Custom);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"active_target\""));

        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        // stale cached values in storage are ignored
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["metrics"]["tdee"] = serde_json::json!(9999);
        value["active_target"]["calories"] = serde_json::json!(1);
        let tampered: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(tampered, p);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: Profile = serde_json::from_str(r#"{"name":"Ana","weight_kg":60}"#).unwrap();
        assert_eq!(p.settings().name, "Ana");
        assert_eq!(p.settings().age, 30);
        // 600 + 1062.5 - 150 + 5
        assert_eq!(p.metrics().bmr, 1518);
    }

    #[test]
    fn test_loaded_custom_profile_without_table_is_seeded() {
        let p: Profile = serde_json::from_str(
            r#"{"diet_strategy":"carb_cycling","target_mode":"custom","cycle_day":"high_carb"}"#,
        )
        .unwrap();
        assert_eq!(p.active_target().calories, 1800);
    }

    #[test]
    fn test_parse_edits() {
        assert_eq!(ProfileEdit::parse("weight", "72.5").unwrap(), ProfileEdit::WeightKg(72.5));
        assert_eq!(ProfileEdit::parse("body_fat", "none").unwrap(), ProfileEdit::BodyFatPct(None));
        assert_eq!(
            ProfileEdit::parse("strategy", "carb-cycling").unwrap(),
            ProfileEdit::Strategy(DietStrategy::CarbCycling)
        );
        assert!(ProfileEdit::parse("height", "tall").is_err());
        assert!(ProfileEdit::parse("shoe-size", "42").is_err());
    }

    #[test]
    fn test_bmi_category() {
        let p = Profile::default();
        assert_eq!(p.bmi_category(), BmiCategory::Overweight);
    }
}
