use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::intake::{DailyIntakeRecord, FoodCatalog, FoodNutrient, MacroTotals, Nutrient, sum_macros};
use crate::nutrition::NutritionalProfile;
use crate::types::{FoodId, NutrientId, UserId};

/// Age splitting the population into the two comparison cohorts: strictly
/// below goes to under-30, everything else (the boundary included) to 30-plus.
pub const COHORT_AGE_BOUNDARY: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cohort {
    UnderThirty,
    ThirtyPlus,
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cohort::UnderThirty => write!(f, "under-30"),
            Cohort::ThirtyPlus => write!(f, "30-plus"),
        }
    }
}

/// Per-cohort averages: every metric is the cohort total divided by the
/// number of profiles in the cohort. A cohort with zero profiles keeps all
/// metrics at zero rather than dividing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupTotals {
    pub profile_count: usize,
    pub macros: MacroTotals,
    /// Nutrient name → average accumulated quantity, in the nutrient's unit.
    pub micronutrients: BTreeMap<String, Decimal>,
}

impl GroupTotals {
    fn average_over_profiles(&mut self) {
        if self.profile_count == 0 {
            return;
        }
        let n = Decimal::from(self.profile_count as u64);
        self.macros.calories /= n;
        self.macros.protein_g /= n;
        self.macros.carbs_g /= n;
        self.macros.fat_g /= n;
        for quantity in self.micronutrients.values_mut() {
            *quantity /= n;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortBreakdown {
    pub under_thirty: GroupTotals,
    pub thirty_plus: GroupTotals,
}

/// Partition profiles at the age-30 boundary and average each cohort's intake
/// over the optional inclusive date range.
///
/// Explicit, on-demand computation: the caller decides when to run it and
/// over which window. Records are grouped by user once up front, and
/// per-food nutrient links are indexed once, so the sweep does not rescan
/// the flat collections per profile.
pub fn aggregate_by_age_cohort(
    profiles: &[NutritionalProfile],
    records: &[DailyIntakeRecord],
    catalog: &FoodCatalog,
    food_nutrients: &[FoodNutrient],
    nutrients: &[Nutrient],
    date_range: Option<(NaiveDate, NaiveDate)>,
) -> CohortBreakdown {
    let mut by_user: HashMap<UserId, Vec<&DailyIntakeRecord>> = HashMap::new();
    for record in records {
        by_user.entry(record.user).or_default().push(record);
    }

    let mut nutrients_by_food: HashMap<FoodId, Vec<&FoodNutrient>> = HashMap::new();
    for link in food_nutrients {
        nutrients_by_food.entry(link.food).or_default().push(link);
    }
    let nutrient_names: HashMap<NutrientId, &str> =
        nutrients.iter().map(|n| (n.id, n.name.as_str())).collect();

    let mut under_thirty = GroupTotals::default();
    let mut thirty_plus = GroupTotals::default();

    for profile in profiles {
        let group = if profile.age < COHORT_AGE_BOUNDARY {
            &mut under_thirty
        } else {
            &mut thirty_plus
        };
        group.profile_count += 1;

        let in_range: Vec<&DailyIntakeRecord> = by_user
            .get(&profile.user)
            .map(|user_records| {
                user_records
                    .iter()
                    .copied()
                    .filter(|r| match date_range {
                        Some((from, to)) => r.date >= from && r.date <= to,
                        None => true,
                    })
                    .collect()
            })
            .unwrap_or_default();

        group.macros.merge(&sum_macros(in_range.iter().copied(), catalog));

        for record in &in_range {
            let Some(links) = nutrients_by_food.get(&record.food) else {
                continue;
            };
            for link in links {
                let Some(name) = nutrient_names.get(&link.nutrient) else {
                    debug!(nutrient = link.nutrient.0, "skipping link to unknown nutrient");
                    continue;
                };
                *group.micronutrients.entry((*name).to_string()).or_default() +=
                    link.quantity * record.quantity;
            }
        }
    }

    under_thirty.average_over_profiles();
    thirty_plus.average_over_profiles();

    CohortBreakdown { under_thirty, thirty_plus }
}

/// Outcome of the cohort comparison: the label plus one free-text reason per
/// comparison made.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub higher_risk: Cohort,
    pub reasons: Vec<String>,
}

/// Compare the two cohorts and attribute the higher-risk label to whichever
/// averages more calories. The comparison is a strict greater-than, so a tie
/// falls through to the 30-plus cohort. Each macro gets one directional
/// statement; micronutrient diversity is mentioned only when the distinct
/// counts differ.
pub fn evaluate_risk(breakdown: &CohortBreakdown) -> RiskAssessment {
    let under = &breakdown.under_thirty;
    let over = &breakdown.thirty_plus;

    let higher_risk = if under.macros.calories > over.macros.calories {
        Cohort::UnderThirty
    } else {
        Cohort::ThirtyPlus
    };

    let mut reasons = Vec::new();
    let (hi, hi_cal, lo_cal) = match higher_risk {
        Cohort::UnderThirty => (Cohort::UnderThirty, under.macros.calories, over.macros.calories),
        Cohort::ThirtyPlus => (Cohort::ThirtyPlus, over.macros.calories, under.macros.calories),
    };
    reasons.push(format!(
        "the {hi} cohort averages {} kcal per user against {}",
        hi_cal.round_dp(1),
        lo_cal.round_dp(1)
    ));

    let macro_pairs = [
        ("protein", under.macros.protein_g, over.macros.protein_g),
        ("carbohydrate", under.macros.carbs_g, over.macros.carbs_g),
        ("fat", under.macros.fat_g, over.macros.fat_g),
    ];
    for (label, under_avg, over_avg) in macro_pairs {
        if under_avg > over_avg {
            reasons.push(format!(
                "under-30 users average more {label} ({} g vs {} g)",
                under_avg.round_dp(1),
                over_avg.round_dp(1)
            ));
        } else {
            reasons.push(format!(
                "30-plus users average at least as much {label} ({} g vs {} g)",
                over_avg.round_dp(1),
                under_avg.round_dp(1)
            ));
        }
    }

    let under_kinds = under.micronutrients.len();
    let over_kinds = over.micronutrients.len();
    if under_kinds != over_kinds {
        reasons.push(format!(
            "micronutrient diversity differs: {under_kinds} distinct nutrients tracked under 30 vs {over_kinds} at 30-plus"
        ));
    }

    RiskAssessment { higher_risk, reasons }
}
