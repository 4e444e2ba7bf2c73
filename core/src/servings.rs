use crate::models::ServingTargets;

/// Round to `decimals` places, halves away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

const fn band(
    grains: f64,
    proteins: f64,
    vegetables: f64,
    fruits: f64,
    dairy: f64,
    oils: f64,
) -> ServingTargets {
    ServingTargets {
        grains,
        proteins,
        vegetables,
        fruits,
        dairy,
        oils,
    }
}

/// Upper bounds (exclusive) of each calorie band, paired with that band's servings.
/// The bands are hand-tuned and not evenly spaced.
const SERVING_BANDS: &[(i64, ServingTargets)] = &[
    (1350, band(1.5, 3.0, 3.0, 2.0, 1.5, 3.0)),
    (1650, band(2.5, 4.0, 3.0, 2.0, 1.5, 4.0)),
    (1900, band(3.0, 5.0, 3.0, 2.0, 1.5, 5.0)),
    (2100, band(3.5, 6.0, 4.0, 3.0, 1.5, 6.0)),
    (2350, band(4.0, 6.0, 4.0, 3.5, 1.5, 6.0)),
    (2600, band(4.5, 7.0, 5.0, 4.0, 1.5, 7.0)),
];

const TOP_BAND: ServingTargets = band(5.0, 8.0, 5.0, 4.0, 2.0, 8.0);

/// Baseline six-group servings for a daily calorie target.
///
/// A value exactly on a boundary belongs to the higher band: the comparison is
/// `calories < upper`, checked lowest band first.
#[must_use]
pub fn baseline_servings(calories: i64) -> ServingTargets {
    SERVING_BANDS
        .iter()
        .find(|(upper, _)| calories < *upper)
        .map_or(TOP_BAND, |(_, servings)| *servings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert!((round_to(24.221, 1) - 24.2).abs() < f64::EPSILON);
        assert!((round_to(2.25, 0) - 2.0).abs() < f64::EPSILON);
        assert!((round_to(2.5, 0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lowest_band() {
        let s = baseline_servings(1200);
        assert_eq!(s, band(1.5, 3.0, 3.0, 2.0, 1.5, 3.0));
        assert_eq!(baseline_servings(-500), s);
    }

    #[test]
    fn test_boundary_belongs_to_upper_band() {
        // 1349 is the last value of the first band; 1350 starts the second
        assert!((baseline_servings(1349).grains - 1.5).abs() < f64::EPSILON);
        assert!((baseline_servings(1350).grains - 2.5).abs() < f64::EPSILON);
        assert!((baseline_servings(1899).grains - 3.0).abs() < f64::EPSILON);
        assert!((baseline_servings(1900).grains - 3.5).abs() < f64::EPSILON);
        assert!((baseline_servings(2599).grains - 4.5).abs() < f64::EPSILON);
        assert_eq!(baseline_servings(2600), TOP_BAND);
    }

    #[test]
    fn test_reference_band() {
        // 2173 kcal sits in the 2100..2350 band
        let s = baseline_servings(2173);
        assert_eq!(s, band(4.0, 6.0, 4.0, 3.5, 1.5, 6.0));
    }

    #[test]
    fn test_top_band_has_extra_dairy() {
        let s = baseline_servings(4000);
        assert!((s.dairy - 2.0).abs() < f64::EPSILON);
        assert!((s.proteins - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bands_increase_monotonically() {
        let calories = [1000, 1400, 1700, 2000, 2200, 2400, 2700];
        let tiers: Vec<ServingTargets> = calories.iter().map(|c| baseline_servings(*c)).collect();
        for pair in tiers.windows(2) {
            assert!(pair[1].grains > pair[0].grains);
            assert!(pair[1].proteins >= pair[0].proteins);
            assert!(pair[1].oils >= pair[0].oils);
        }
    }
}
