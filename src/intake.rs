use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LimitBands, NeedsConfig};
use crate::error::{Error, Result};
use crate::nutrition::{MacroTargets, NutritionalProfile, daily_needs};
use crate::types::{FoodId, NutrientId, UserId};

/// A food definition with per-unit calorie and macro content. Nutrient values
/// are non-negative (enforced at the dataset boundary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: FoodId,
    /// None marks a shared catalog item visible to every user.
    pub owner: Option<UserId>,
    pub name: String,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A tracked micronutrient, e.g. iron in mg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrient {
    pub id: NutrientId,
    pub name: String,
    pub unit: String,
}

/// Joins a food to a nutrient with the per-unit quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodNutrient {
    pub food: FoodId,
    pub nutrient: NutrientId,
    pub quantity: Decimal,
}

/// One logging event: `quantity` units of `food` consumed on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyIntakeRecord {
    pub user: UserId,
    pub food: FoodId,
    pub date: NaiveDate,
    pub quantity: Decimal,
    /// Set by the caller from [`exceeds_limits`] after analysis and persisted
    /// with the record.
    #[serde(default)]
    pub exceeded: bool,
}

/// Id-indexed food collection. Aggregation passes look foods up here instead
/// of rescanning a flat list per record.
#[derive(Debug, Clone, Default)]
pub struct FoodCatalog {
    foods: HashMap<FoodId, FoodItem>,
}

impl FoodCatalog {
    pub fn index(foods: impl IntoIterator<Item = FoodItem>) -> Self {
        FoodCatalog { foods: foods.into_iter().map(|f| (f.id, f)).collect() }
    }

    pub fn get(&self, id: FoodId) -> Option<&FoodItem> {
        self.foods.get(&id)
    }

    /// Foods the user can log: their own plus shared catalog items.
    pub fn visible_to(&self, user: UserId) -> impl Iterator<Item = &FoodItem> {
        self.foods.values().filter(move |f| f.owner.is_none() || f.owner == Some(user))
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }
}

/// Calorie and macro totals accumulated over a set of records. Calories in
/// kcal, macros in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MacroTotals {
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
}

impl MacroTotals {
    fn add_scaled(&mut self, food: &FoodItem, quantity: Decimal) {
        self.calories += food.calories * quantity;
        self.protein_g += food.protein_g * quantity;
        self.carbs_g += food.carbs_g * quantity;
        self.fat_g += food.fat_g * quantity;
    }

    pub fn merge(&mut self, other: &MacroTotals) {
        self.calories += other.calories;
        self.protein_g += other.protein_g;
        self.carbs_g += other.carbs_g;
        self.fat_g += other.fat_g;
    }
}

/// Sum quantity-scaled macros across `records`. The shared accumulation
/// primitive behind both the daily analysis and the cohort aggregation.
///
/// Records referencing a food missing from the catalog are skipped: a stale
/// reference is a configuration gap recovered locally, not a failure of the
/// whole sweep.
pub fn sum_macros<'a>(
    records: impl IntoIterator<Item = &'a DailyIntakeRecord>,
    catalog: &FoodCatalog,
) -> MacroTotals {
    let mut totals = MacroTotals::default();
    for record in records {
        match catalog.get(record.food) {
            Some(food) => totals.add_scaled(food, record.quantity),
            None => {
                debug!(food = record.food.0, user = record.user.0, "skipping record for unknown food");
            }
        }
    }
    totals
}

/// Consumed percentage of the daily target, per macro. 100 = exactly on
/// target; a zero-valued target reports 0 rather than dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroPercentages {
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fat: Decimal,
}

impl MacroPercentages {
    pub fn values(&self) -> [Decimal; 4] {
        [self.calories, self.protein, self.carbs, self.fat]
    }
}

/// Result of comparing a day's consumption against the daily targets.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeAnalysis {
    pub consumed: MacroTotals,
    /// needs − consumed per macro. Negative values signal overshoot and are
    /// preserved, never clamped.
    pub remaining: MacroTotals,
    pub percent_of_needs: MacroPercentages,
}

fn percent(consumed: Decimal, target: Decimal) -> Decimal {
    if target.is_zero() { Decimal::ZERO } else { consumed / target * dec!(100) }
}

/// Sum the records against the catalog and compare with `needs`.
pub fn analyze_intake<'a>(
    records: impl IntoIterator<Item = &'a DailyIntakeRecord>,
    catalog: &FoodCatalog,
    needs: &MacroTargets,
) -> IntakeAnalysis {
    let consumed = sum_macros(records, catalog);
    IntakeAnalysis {
        consumed,
        remaining: MacroTotals {
            calories: needs.calories - consumed.calories,
            protein_g: needs.protein_g - consumed.protein_g,
            carbs_g: needs.carbs_g - consumed.carbs_g,
            fat_g: needs.fat_g - consumed.fat_g,
        },
        percent_of_needs: MacroPercentages {
            calories: percent(consumed.calories, needs.calories),
            protein: percent(consumed.protein_g, needs.protein_g),
            carbs: percent(consumed.carbs_g, needs.carbs_g),
            fat: percent(consumed.fat_g, needs.fat_g),
        },
    }
}

/// True when every macro sits inside the met band of its target.
pub fn has_met_limits(analysis: &IntakeAnalysis, bands: &LimitBands) -> bool {
    analysis
        .percent_of_needs
        .values()
        .iter()
        .all(|p| *p >= bands.met_floor && *p <= bands.met_ceiling)
}

/// True when the day is short of target but close: not met, nothing over the
/// met ceiling, and at least one macro inside the warning band.
pub fn is_approaching_limits(analysis: &IntakeAnalysis, bands: &LimitBands) -> bool {
    let values = analysis.percent_of_needs.values();
    !has_met_limits(analysis, bands)
        && values.iter().all(|p| *p <= bands.met_ceiling)
        && values.iter().any(|p| *p >= bands.approach_floor && *p < bands.met_floor)
}

/// True when any macro is over the met ceiling. The caller persists this into
/// the day's [`DailyIntakeRecord::exceeded`] flag.
pub fn exceeds_limits(analysis: &IntakeAnalysis, bands: &LimitBands) -> bool {
    analysis.percent_of_needs.values().iter().any(|p| *p > bands.met_ceiling)
}

/// Everything the presentation layer needs for one user's day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub needs: MacroTargets,
    pub analysis: IntakeAnalysis,
    pub met: bool,
    pub approaching: bool,
    pub exceeded: bool,
}

/// Entry point for a single user's daily view: resolve the profile, compute
/// needs, analyse the supplied records (the caller scopes them to the day of
/// interest) and classify against the bands.
///
/// A user without a profile is a distinct condition the caller must handle by
/// prompting for profile setup, never a silent zero-valued default.
pub fn daily_report(
    profiles: &[NutritionalProfile],
    user: UserId,
    records: &[DailyIntakeRecord],
    catalog: &FoodCatalog,
    needs_config: &NeedsConfig,
    bands: &LimitBands,
) -> Result<DailyReport> {
    let profile =
        profiles.iter().find(|p| p.user == user).ok_or(Error::MissingProfile { user })?;
    let needs = daily_needs(profile, needs_config);
    let analysis = analyze_intake(records.iter().filter(|r| r.user == user), catalog, &needs);
    let met = has_met_limits(&analysis, bands);
    let approaching = is_approaching_limits(&analysis, bands);
    let exceeded = exceeds_limits(&analysis, bands);
    Ok(DailyReport { needs, analysis, met, approaching, exceeded })
}
