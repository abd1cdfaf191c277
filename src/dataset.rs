use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::intake::{DailyIntakeRecord, FoodItem, FoodNutrient, Nutrient};
use crate::nutrition::NutritionalProfile;
use crate::vehicle::{RatingFactor, Vehicle};

/// The fully materialized working set an external store would hand the
/// engines: plain collections, fetched before any computation starts.
#[derive(Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub rating_factors: Vec<RatingFactor>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub profiles: Vec<NutritionalProfile>,
    #[serde(default)]
    pub foods: Vec<FoodItem>,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
    #[serde(default)]
    pub intake_records: Vec<DailyIntakeRecord>,
}

const MIN_WEIGHT_KG: Decimal = dec!(10);
const MAX_WEIGHT_KG: Decimal = dec!(500);
const MIN_HEIGHT_M: Decimal = dec!(0.5);
const MAX_HEIGHT_M: Decimal = dec!(3.0);
const MAX_AGE: u8 = 150;

impl Dataset {
    /// Read and validate a JSON dataset. Everything that reaches the engines
    /// has passed [`Dataset::validate`]; the engines themselves do not
    /// re-check ranges.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// The input-validation boundary: range checks on profiles, non-negative
    /// nutrient and currency values, well-formed rating rows and positive
    /// intake quantities. First violation wins.
    pub fn validate(&self) -> Result<()> {
        for profile in &self.profiles {
            if profile.age > MAX_AGE {
                return Err(invalid("profile.age", format!("{} exceeds {MAX_AGE}", profile.age)));
            }
            if profile.weight_kg < MIN_WEIGHT_KG || profile.weight_kg > MAX_WEIGHT_KG {
                return Err(invalid(
                    "profile.weight_kg",
                    format!("{} outside [{MIN_WEIGHT_KG}, {MAX_WEIGHT_KG}]", profile.weight_kg),
                ));
            }
            if profile.height_m < MIN_HEIGHT_M || profile.height_m > MAX_HEIGHT_M {
                return Err(invalid(
                    "profile.height_m",
                    format!("{} outside [{MIN_HEIGHT_M}, {MAX_HEIGHT_M}]", profile.height_m),
                ));
            }
        }

        for food in &self.foods {
            let fields = [
                ("food.calories", food.calories),
                ("food.protein_g", food.protein_g),
                ("food.carbs_g", food.carbs_g),
                ("food.fat_g", food.fat_g),
            ];
            for (field, value) in fields {
                if value.is_sign_negative() && !value.is_zero() {
                    return Err(invalid(field, format!("{value} is negative ({})", food.name)));
                }
            }
        }

        for vehicle in &self.vehicles {
            if vehicle.declared_value.is_sign_negative() && !vehicle.declared_value.is_zero() {
                return Err(invalid(
                    "vehicle.declared_value",
                    format!("{} is negative", vehicle.declared_value),
                ));
            }
        }

        for factor in &self.rating_factors {
            if factor.year_from > factor.year_to {
                return Err(invalid(
                    "rating_factor",
                    format!("empty year range [{}, {}]", factor.year_from, factor.year_to),
                ));
            }
            if factor.factor.is_sign_negative() && !factor.factor.is_zero() {
                return Err(invalid("rating_factor.factor", format!("{} is negative", factor.factor)));
            }
        }

        for record in &self.intake_records {
            if record.quantity <= Decimal::ZERO {
                return Err(invalid(
                    "intake_record.quantity",
                    format!("{} must be positive", record.quantity),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &'static str, detail: String) -> Error {
    Error::Invalid { field, detail }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::nutrition::{ActivityLevel, Sex};
    use crate::types::{FoodId, UserId};
    use crate::vehicle::IncidentType;

    fn valid_profile() -> NutritionalProfile {
        NutritionalProfile {
            user: UserId(1),
            age: 35,
            sex: Sex::Female,
            weight_kg: dec!(62),
            height_m: dec!(1.68),
            activity_level: ActivityLevel::Moderate,
        }
    }

    #[test]
    fn valid_dataset_passes() {
        let dataset = Dataset { profiles: vec![valid_profile()], ..Dataset::default() };
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn profile_weight_out_of_range_is_rejected() {
        let mut profile = valid_profile();
        profile.weight_kg = dec!(9.9);
        let dataset = Dataset { profiles: vec![profile], ..Dataset::default() };
        let err = dataset.validate().unwrap_err();
        assert!(matches!(err, Error::Invalid { field: "profile.weight_kg", .. }), "got {err}");
    }

    #[test]
    fn profile_height_out_of_range_is_rejected() {
        let mut profile = valid_profile();
        profile.height_m = dec!(3.1);
        let dataset = Dataset { profiles: vec![profile], ..Dataset::default() };
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn negative_food_macro_is_rejected() {
        let food = FoodItem {
            id: FoodId(1),
            owner: None,
            name: "broken".to_string(),
            calories: dec!(100),
            protein_g: dec!(-1),
            carbs_g: dec!(0),
            fat_g: dec!(0),
            description: String::new(),
            image: None,
        };
        let dataset = Dataset { foods: vec![food], ..Dataset::default() };
        let err = dataset.validate().unwrap_err();
        assert!(matches!(err, Error::Invalid { field: "food.protein_g", .. }), "got {err}");
    }

    #[test]
    fn inverted_factor_range_is_rejected() {
        let factor = RatingFactor {
            year_from: 2020,
            year_to: 2010,
            factor: dec!(0.5),
            incident_type: IncidentType::Accident,
        };
        let dataset = Dataset { rating_factors: vec![factor], ..Dataset::default() };
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let record = DailyIntakeRecord {
            user: UserId(1),
            food: FoodId(1),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            quantity: Decimal::ZERO,
            exceeded: false,
        };
        let dataset = Dataset { intake_records: vec![record], ..Dataset::default() };
        assert!(dataset.validate().is_err());
    }

    /// The dataset deserializes from the documented JSON shape; absent
    /// collections default to empty.
    #[test]
    fn dataset_json_shape() {
        let raw = r#"{
            "rating_factors": [
                {"year_from": 1990, "year_to": 2020, "factor": "0.5", "incident_type": "theft"}
            ],
            "vehicles": [
                {"id": 1, "owner": 7, "brand": "Seat", "model": "Ibiza", "year": 2015,
                 "declared_value": "10000", "incident_type": "theft"}
            ],
            "intake_records": [
                {"user": 7, "food": 3, "date": "2024-05-01", "quantity": "1.5"}
            ]
        }"#;
        let dataset: Dataset = serde_json::from_str(raw).unwrap();
        assert!(dataset.validate().is_ok());
        assert_eq!(dataset.rating_factors.len(), 1);
        assert_eq!(dataset.vehicles[0].declared_value, dec!(10000));
        assert!(dataset.profiles.is_empty());
        assert!(!dataset.intake_records[0].exceeded, "exceeded defaults to false");
    }
}
