//! Diet-strategy adjustment of the calorie target and food-group servings.
//!
//! Under carb cycling the serving baseline is re-selected for the *adjusted*
//! calorie value, then reshaped toward carbs (high-carb day) or toward protein,
//! vegetables and fats (low-carb day).

use crate::models::{CycleDay, DietStrategy, Goal, NutritionTarget, ServingTargets};
use crate::servings::{baseline_servings, round_to};

/// Share of the baseline calories eaten for a strategy/goal/day combination.
///
/// The cycle day only matters under [`DietStrategy::CarbCycling`].
#[must_use]
pub fn calorie_multiplier(strategy: DietStrategy, goal: Goal, day: CycleDay) -> f64 {
    match (strategy, goal, day) {
        (DietStrategy::Balanced, Goal::LoseWeight, _) => 0.85,
        (DietStrategy::Balanced, Goal::Maintain, _) => 1.0,
        (DietStrategy::Balanced, Goal::GainMuscle, _) => 1.1,
        (DietStrategy::CarbCycling, Goal::GainMuscle, CycleDay::HighCarb) => 1.15,
        (DietStrategy::CarbCycling, Goal::GainMuscle, CycleDay::LowCarb) => 0.95,
        (DietStrategy::CarbCycling, _, CycleDay::HighCarb) => 1.0,
        (DietStrategy::CarbCycling, _, CycleDay::LowCarb) => 0.75,
    }
}

fn high_carb_servings(base: ServingTargets) -> ServingTargets {
    ServingTargets {
        grains: round_to(base.grains * 1.3, 1),
        fruits: round_to(base.fruits * 1.2, 1),
        oils: (base.oils * 0.8).round().max(3.0),
        ..base
    }
}

fn low_carb_servings(base: ServingTargets, goal: Goal) -> ServingTargets {
    let grain_factor = if goal == Goal::GainMuscle { 0.5 } else { 0.3 };
    ServingTargets {
        grains: round_to(base.grains * grain_factor, 1).max(0.5),
        fruits: round_to(base.fruits * 0.5, 1).max(1.0),
        proteins: round_to(base.proteins * 1.4, 1),
        vegetables: round_to(base.vegetables * 1.3, 1),
        oils: round_to(base.oils * 1.5, 1),
        dairy: base.dairy,
    }
}

/// Adjust a baseline calorie value (normally TDEE) for the diet strategy, and
/// derive the matching servings.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn adjust_for_strategy(
    base_calories: i64,
    strategy: DietStrategy,
    day: CycleDay,
    goal: Goal,
) -> NutritionTarget {
    let calories =
        (base_calories as f64 * calorie_multiplier(strategy, goal, day)).round() as i64;
    let baseline = baseline_servings(calories);
    let servings = match (strategy, day) {
        (DietStrategy::Balanced, _) => baseline,
        (DietStrategy::CarbCycling, CycleDay::HighCarb) => high_carb_servings(baseline),
        (DietStrategy::CarbCycling, CycleDay::LowCarb) => low_carb_servings(baseline, goal),
    };
    NutritionTarget::new(calories, servings)
}
