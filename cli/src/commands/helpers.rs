use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use std::process;

use nutritrack_core::models::{FoodGroup, ServingTargets};

pub(crate) const LBS_PER_KG: f64 = 2.20462;
const KG_PER_LB: f64 = 0.453_592;

/// Food-group servings given as command-line flags. Omitted groups are zero.
#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct ServingArgs {
    /// Grain servings
    #[arg(long, default_value_t = 0.0)]
    pub grains: f64,
    /// Protein servings
    #[arg(long, default_value_t = 0.0)]
    pub proteins: f64,
    /// Vegetable servings
    #[arg(long, default_value_t = 0.0)]
    pub vegetables: f64,
    /// Fruit servings
    #[arg(long, default_value_t = 0.0)]
    pub fruits: f64,
    /// Dairy servings
    #[arg(long, default_value_t = 0.0)]
    pub dairy: f64,
    /// Oil servings
    #[arg(long, default_value_t = 0.0)]
    pub oils: f64,
}

impl From<ServingArgs> for ServingTargets {
    fn from(args: ServingArgs) -> Self {
        Self {
            grains: args.grains,
            proteins: args.proteins,
            vegetables: args.vegetables,
            fruits: args.fruits,
            dairy: args.dairy,
            oils: args.oils,
        }
    }
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Convert a weight in `kg` or `lbs` to kilograms.
pub(crate) fn weight_to_kg(value: f64, unit: &str) -> Result<f64> {
    if value <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    match unit.to_lowercase().as_str() {
        "kg" => Ok(value),
        "lbs" | "lb" => Ok(no_neg_zero(value * KG_PER_LB)),
        _ => bail!("Invalid unit '{unit}'. Use 'kg' or 'lbs'"),
    }
}

/// A serving count with at most one decimal, without a trailing `.0`.
pub(crate) fn fmt_servings(v: f64) -> String {
    let v = no_neg_zero(v);
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// Compact one-line rendering of all six groups, e.g. `grains 3 | proteins 2.5 | ...`.
pub(crate) fn format_servings(servings: &ServingTargets) -> String {
    FoodGroup::ALL
        .iter()
        .map(|g| format!("{} {}", g.as_str(), fmt_servings(servings.get(*g))))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub(crate) fn fmt_optional(v: Option<f64>, suffix: &str) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{suffix}"))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing record and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
