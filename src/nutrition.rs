use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::NeedsConfig;
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// Per-user anthropometric profile, one per user.
///
/// Ranges (age ≤ 150, weight 10–500 kg, height 0.5–3.0 m) are enforced at the
/// dataset boundary; the engine trusts what it is given and computes garbage
/// from garbage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionalProfile {
    pub user: UserId,
    pub age: u8,
    pub sex: Sex,
    pub weight_kg: Decimal,
    pub height_m: Decimal,
    pub activity_level: ActivityLevel,
}

impl NutritionalProfile {
    /// Zero-valued profile for the caller's create-on-first-access flow.
    /// Analysis against an empty profile is meaningless; callers surface
    /// [`crate::error::Error::MissingProfile`] instead of analysing one.
    pub fn empty(user: UserId) -> Self {
        NutritionalProfile {
            user,
            age: 0,
            sex: Sex::Male,
            weight_kg: Decimal::ZERO,
            height_m: Decimal::ZERO,
            activity_level: ActivityLevel::Sedentary,
        }
    }
}

/// Calorie and macronutrient targets for one day. Calories in kcal, macros in
/// grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroTargets {
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
}

pub const KCAL_PER_G_PROTEIN: Decimal = dec!(4);
pub const KCAL_PER_G_CARBS: Decimal = dec!(4);
pub const KCAL_PER_G_FAT: Decimal = dec!(9);

/// Mifflin-St Jeor resting energy expenditure in kcal/day:
/// `10·kg + 6.25·cm − 5·age`, then `+5` for males or `−161` for females.
/// Pure function of the four profile fields.
pub fn bmr(profile: &NutritionalProfile) -> Decimal {
    let height_cm = profile.height_m * dec!(100);
    let base = dec!(10) * profile.weight_kg + dec!(6.25) * height_cm
        - dec!(5) * Decimal::from(profile.age);
    match profile.sex {
        Sex::Male => base + dec!(5),
        Sex::Female => base - dec!(161),
    }
}

/// Daily calorie target (BMR scaled by the activity multiplier) and macro
/// targets derived from it via the configured calorie split, converted to
/// grams at 4/4/9 kcal per gram.
pub fn daily_needs(profile: &NutritionalProfile, config: &NeedsConfig) -> MacroTargets {
    let calories = bmr(profile) * config.multiplier(profile.activity_level);
    MacroTargets {
        calories,
        protein_g: calories * config.protein_share / KCAL_PER_G_PROTEIN,
        carbs_g: calories * config.carb_share / KCAL_PER_G_CARBS,
        fat_g: calories * config.fat_share / KCAL_PER_G_FAT,
    }
}
