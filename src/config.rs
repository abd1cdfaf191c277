use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::nutrition::ActivityLevel;

/// Tunables for the daily-needs computation: activity multipliers applied to
/// BMR, and the share of the calorie target allotted to each macronutrient.
#[derive(Debug, Clone)]
pub struct NeedsConfig {
    pub sedentary: Decimal,
    pub light: Decimal,
    pub moderate: Decimal,
    pub active: Decimal,
    pub very_active: Decimal,
    /// Calorie shares per macro. Must sum to 1.
    pub protein_share: Decimal,
    pub carb_share: Decimal,
    pub fat_share: Decimal,
}

impl NeedsConfig {
    /// Standard TDEE activity factors (1.2 through 1.9, strictly increasing)
    /// and a 30/40/30 protein/carb/fat calorie split.
    pub fn canonical() -> Self {
        NeedsConfig {
            sedentary: dec!(1.2),
            light: dec!(1.375),
            moderate: dec!(1.55),
            active: dec!(1.725),
            very_active: dec!(1.9),
            protein_share: dec!(0.30),
            carb_share: dec!(0.40),
            fat_share: dec!(0.30),
        }
    }

    pub fn multiplier(&self, level: ActivityLevel) -> Decimal {
        match level {
            ActivityLevel::Sedentary => self.sedentary,
            ActivityLevel::Light => self.light,
            ActivityLevel::Moderate => self.moderate,
            ActivityLevel::Active => self.active,
            ActivityLevel::VeryActive => self.very_active,
        }
    }
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Percent-of-target bands for limit classification. All values are percents.
///
/// met: every macro in [met_floor, met_ceiling].
/// approaching: not met, nothing above met_ceiling, and at least one macro in
/// [approach_floor, met_floor).
/// exceeded: any macro above met_ceiling.
#[derive(Debug, Clone)]
pub struct LimitBands {
    pub met_floor: Decimal,
    pub met_ceiling: Decimal,
    pub approach_floor: Decimal,
}

impl LimitBands {
    /// 95–105% counts as met, 90–95% as approaching.
    pub fn canonical() -> Self {
        LimitBands { met_floor: dec!(95), met_ceiling: dec!(105), approach_floor: dec!(90) }
    }
}

impl Default for LimitBands {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_macro_shares_sum_to_one() {
        let config = NeedsConfig::canonical();
        assert_eq!(config.protein_share + config.carb_share + config.fat_share, dec!(1));
    }

    #[test]
    fn canonical_multipliers_strictly_increase_with_activity() {
        let config = NeedsConfig::canonical();
        let ordered = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ];
        for pair in ordered.windows(2) {
            assert!(
                config.multiplier(pair[0]) < config.multiplier(pair[1]),
                "multiplier must increase from {:?} to {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn canonical_bands_are_ordered() {
        let bands = LimitBands::canonical();
        assert!(bands.approach_floor < bands.met_floor);
        assert!(bands.met_floor < bands.met_ceiling);
    }
}
