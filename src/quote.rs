use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::vehicle::{IncidentType, Quotation, RatingFactor, Vehicle};

/// Flat coverage fraction applied when no rating factor matches the vehicle.
/// A gap in the rating table is a configuration problem recovered locally,
/// never an error surfaced to the caller.
pub const FALLBACK_RATE: Decimal = dec!(0.90);

/// Fixed severity adjustment per incident type.
fn incident_multiplier(incident_type: IncidentType) -> Decimal {
    match incident_type {
        IncidentType::Theft => dec!(1.25),
        IncidentType::Accident => dec!(1.15),
        IncidentType::FactoryDefect => dec!(1.05),
    }
}

/// Price a vehicle against the rating table.
///
/// Takes the first factor (in table order) whose incident type matches and
/// whose inclusive year range contains the vehicle's year, then applies the
/// incident multiplier and caps at the declared value:
/// `min(declared × factor × multiplier, declared)`.
///
/// With no matching factor the result is a flat `declared × 0.90`, with no
/// incident adjustment. Exact decimal arithmetic throughout; the value is
/// returned unrounded and rounded to currency scale only when stored on a
/// [`Quotation`].
pub fn quote(vehicle: &Vehicle, factors: &[RatingFactor]) -> Decimal {
    let Some(factor) = factors.iter().find(|f| f.covers(vehicle)) else {
        debug!(
            vehicle = vehicle.id.0,
            year = vehicle.year,
            "no rating factor matched, applying fallback coverage"
        );
        return vehicle.declared_value * FALLBACK_RATE;
    };

    let base = vehicle.declared_value * factor.factor;
    let adjusted = base * incident_multiplier(vehicle.incident_type);
    adjusted.min(vehicle.declared_value)
}

impl Quotation {
    /// Issue the initial quote for a vehicle. `now` is supplied by the caller
    /// so pricing stays deterministic.
    pub fn issue(vehicle: &Vehicle, factors: &[RatingFactor], now: DateTime<Utc>) -> Self {
        Quotation {
            vehicle: vehicle.id,
            quoted_value: quote(vehicle, factors).round_dp(2),
            created_at: now,
        }
    }
}

/// Re-price an existing quotation after the vehicle's rateable attributes
/// changed. The record is updated in place: `quoted_value` is rewritten,
/// `created_at` is preserved. Idempotent for identical inputs, and the result
/// always equals a fresh quote of the vehicle's current attributes.
pub fn requote(quotation: &mut Quotation, vehicle: &Vehicle, factors: &[RatingFactor]) {
    debug_assert_eq!(quotation.vehicle, vehicle.id);
    quotation.quoted_value = quote(vehicle, factors).round_dp(2);
}

/// A pair of rating rows whose year ranges overlap for the same incident type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorOverlap {
    pub incident_type: IncidentType,
    pub first: (i32, i32),
    pub second: (i32, i32),
}

impl std::fmt::Display for FactorOverlap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}: [{}, {}] overlaps [{}, {}]",
            self.incident_type, self.first.0, self.first.1, self.second.0, self.second.1
        )
    }
}

/// Report overlapping year ranges per incident type, one item per pair.
///
/// The engine itself resolves overlaps by table order (first match wins);
/// running this at data-entry time and rejecting a non-empty result keeps
/// that choice unambiguous.
pub fn validate_factors(factors: &[RatingFactor]) -> Vec<FactorOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in factors.iter().enumerate() {
        for b in &factors[i + 1..] {
            if a.incident_type == b.incident_type
                && a.year_from <= b.year_to
                && b.year_from <= a.year_to
            {
                overlaps.push(FactorOverlap {
                    incident_type: a.incident_type,
                    first: (a.year_from, a.year_to),
                    second: (b.year_from, b.year_to),
                });
            }
        }
    }
    overlaps
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::{UserId, VehicleId};

    fn vehicle(year: i32, declared_value: Decimal, incident_type: IncidentType) -> Vehicle {
        Vehicle {
            id: VehicleId(1),
            owner: Some(UserId(1)),
            brand: "Ford".to_string(),
            model: "Focus".to_string(),
            year,
            declared_value,
            incident_type,
        }
    }

    fn factor(
        year_from: i32,
        year_to: i32,
        value: Decimal,
        incident_type: IncidentType,
    ) -> RatingFactor {
        RatingFactor { year_from, year_to, factor: value, incident_type }
    }

    // ── Worked examples ──────────────────────────────────────────────────────

    /// 10000 × 0.5 = 5000 base, × 1.25 theft = 6250, under the 10000 cap.
    #[test]
    fn theft_quote_worked_example() {
        let v = vehicle(2015, dec!(10000), IncidentType::Theft);
        let factors = [factor(1990, 2020, dec!(0.5), IncidentType::Theft)];
        assert_eq!(quote(&v, &factors), dec!(6250));
    }

    /// Same factor, declared 5000: 2500 × 1.25 = 3125. The factor dominates;
    /// the cap does not bind.
    #[test]
    fn theft_quote_cap_does_not_bind() {
        let v = vehicle(2015, dec!(5000), IncidentType::Theft);
        let factors = [factor(1990, 2020, dec!(0.5), IncidentType::Theft)];
        assert_eq!(quote(&v, &factors), dec!(3125));
    }

    /// factor 1.0 × multiplier 1.25 would give 1250 on a 1000 vehicle; the
    /// cap binds and the quote is exactly the declared value.
    #[test]
    fn cap_binds_when_adjusted_exceeds_declared() {
        let v = vehicle(2015, dec!(1000), IncidentType::Theft);
        let factors = [factor(1990, 2020, dec!(1.0), IncidentType::Theft)];
        assert_eq!(quote(&v, &factors), dec!(1000));
    }

    #[test]
    fn incident_multipliers_per_type() {
        let factors: Vec<RatingFactor> = [
            IncidentType::Accident,
            IncidentType::Theft,
            IncidentType::FactoryDefect,
        ]
        .into_iter()
        .map(|incident_type| factor(2000, 2020, dec!(0.5), incident_type))
        .collect();

        let accident = vehicle(2010, dec!(1000), IncidentType::Accident);
        let theft = vehicle(2010, dec!(1000), IncidentType::Theft);
        let defect = vehicle(2010, dec!(1000), IncidentType::FactoryDefect);

        assert_eq!(quote(&accident, &factors), dec!(575), "500 × 1.15");
        assert_eq!(quote(&theft, &factors), dec!(625), "500 × 1.25");
        assert_eq!(quote(&defect, &factors), dec!(525), "500 × 1.05");
    }

    // ── Fallback ─────────────────────────────────────────────────────────────

    /// No matching factor: exactly declared × 0.90, with no incident
    /// adjustment on top.
    #[test]
    fn fallback_is_flat_ninety_percent() {
        let v = vehicle(2015, dec!(10000), IncidentType::Theft);
        assert_eq!(quote(&v, &[]), dec!(9000));

        // A table with rows that miss on year or incident type behaves the
        // same as an empty table.
        let factors = [
            factor(1950, 1960, dec!(0.5), IncidentType::Theft),
            factor(1990, 2020, dec!(0.5), IncidentType::Accident),
        ];
        assert_eq!(quote(&v, &factors), dec!(9000));
    }

    // ── Lookup order ─────────────────────────────────────────────────────────

    /// Overlapping rows: the first in table order wins.
    #[test]
    fn first_matching_factor_wins() {
        let v = vehicle(2015, dec!(10000), IncidentType::Accident);
        let factors = [
            factor(2010, 2020, dec!(0.4), IncidentType::Accident),
            factor(2000, 2020, dec!(0.8), IncidentType::Accident),
        ];
        // 10000 × 0.4 × 1.15 = 4600, not 10000 × 0.8 × 1.15.
        assert_eq!(quote(&v, &factors), dec!(4600));
    }

    #[test]
    fn validate_factors_reports_overlap_within_incident_type() {
        let factors = [
            factor(2000, 2010, dec!(0.5), IncidentType::Theft),
            factor(2010, 2020, dec!(0.6), IncidentType::Theft),
        ];
        let overlaps = validate_factors(&factors);
        assert_eq!(overlaps.len(), 1, "shared boundary year 2010 overlaps");
        assert_eq!(overlaps[0].incident_type, IncidentType::Theft);
    }

    #[test]
    fn validate_factors_ignores_overlap_across_incident_types() {
        let factors = [
            factor(2000, 2010, dec!(0.5), IncidentType::Theft),
            factor(2000, 2010, dec!(0.6), IncidentType::Accident),
            factor(2011, 2020, dec!(0.7), IncidentType::Theft),
        ];
        assert!(validate_factors(&factors).is_empty(), "disjoint per incident type");
    }

    // ── Quotation lifecycle ──────────────────────────────────────────────────

    #[test]
    fn requote_updates_value_in_place_and_keeps_created_at() {
        let factors = [
            factor(1990, 2020, dec!(0.5), IncidentType::Theft),
            factor(1990, 2020, dec!(0.3), IncidentType::Accident),
        ];
        let now = Utc::now();
        let mut v = vehicle(2015, dec!(10000), IncidentType::Theft);
        let mut quotation = Quotation::issue(&v, &factors, now);
        assert_eq!(quotation.quoted_value, dec!(6250));

        v.incident_type = IncidentType::Accident;
        requote(&mut quotation, &v, &factors);
        assert_eq!(quotation.quoted_value, dec!(3450), "10000 × 0.3 × 1.15");
        assert_eq!(quotation.created_at, now, "created_at survives re-quoting");
    }

    /// Editing then re-quoting matches a fresh vehicle with the same final
    /// attributes: no state carries over from the prior quote.
    #[test]
    fn requote_matches_fresh_quote_of_final_attributes() {
        let factors = [
            factor(1990, 2005, dec!(0.4), IncidentType::Theft),
            factor(2006, 2020, dec!(0.6), IncidentType::Theft),
        ];
        let mut edited = vehicle(1999, dec!(8000), IncidentType::Theft);
        let mut quotation = Quotation::issue(&edited, &factors, Utc::now());

        edited.year = 2012;
        requote(&mut quotation, &edited, &factors);

        let fresh = Quotation::issue(&vehicle(2012, dec!(8000), IncidentType::Theft), &factors, Utc::now());
        assert_eq!(quotation.quoted_value, fresh.quoted_value);
    }

    // ── Properties ───────────────────────────────────────────────────────────

    fn any_incident() -> impl Strategy<Value = IncidentType> {
        prop_oneof![
            Just(IncidentType::Accident),
            Just(IncidentType::Theft),
            Just(IncidentType::FactoryDefect),
        ]
    }

    proptest! {
        /// The cap invariant: a quote never exceeds the declared value, for
        /// any factor value, year range and incident type.
        #[test]
        fn quote_never_exceeds_declared_value(
            declared_cents in 0i64..=5_000_000_00,
            year in 1950i32..=2030,
            factor_hundredths in 0i64..=150,
            year_from in 1950i32..=2030,
            span in 0i32..=40,
            incident_type in any_incident(),
        ) {
            let v = vehicle(year, Decimal::new(declared_cents, 2), incident_type);
            let factors = [factor(
                year_from,
                year_from + span,
                Decimal::new(factor_hundredths, 2),
                incident_type,
            )];
            prop_assert!(quote(&v, &factors) <= v.declared_value);
        }

        /// Quoting is a pure function: identical inputs give a decimal-exact
        /// identical result.
        #[test]
        fn quote_is_idempotent(
            declared_cents in 0i64..=5_000_000_00,
            year in 1950i32..=2030,
            factor_hundredths in 0i64..=150,
            incident_type in any_incident(),
        ) {
            let v = vehicle(year, Decimal::new(declared_cents, 2), incident_type);
            let factors = [factor(1950, 2030, Decimal::new(factor_hundredths, 2), incident_type)];
            prop_assert_eq!(quote(&v, &factors), quote(&v, &factors));
        }

        /// With an empty rating table the result is exactly declared × 0.90.
        #[test]
        fn fallback_exact_for_any_vehicle(
            declared_cents in 0i64..=5_000_000_00,
            year in 1950i32..=2030,
            incident_type in any_incident(),
        ) {
            let v = vehicle(year, Decimal::new(declared_cents, 2), incident_type);
            prop_assert_eq!(quote(&v, &[]), v.declared_value * FALLBACK_RATE);
        }
    }
}
