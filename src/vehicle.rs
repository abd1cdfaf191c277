use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{UserId, VehicleId};

/// Loss category a vehicle is covered against. Closed set: the serde boundary
/// rejects anything else, so downstream matches are total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Accident,
    Theft,
    FactoryDefect,
}

/// A vehicle submitted for quotation. Treated as immutable once quoted;
/// editing rateable attributes obliges the caller to re-quote (see
/// [`crate::quote::requote`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    /// None for stock entries not yet assigned to a customer.
    pub owner: Option<UserId>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    /// Declared asset value. A quote can never exceed it.
    pub declared_value: Decimal,
    pub incident_type: IncidentType,
}

/// One row of the rating table: an inclusive year range and the coverage
/// fraction applied to vehicles in that range, for a single incident type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFactor {
    pub year_from: i32,
    pub year_to: i32,
    pub factor: Decimal,
    pub incident_type: IncidentType,
}

impl RatingFactor {
    /// Whether this row applies to `vehicle`: matching incident type and the
    /// vehicle's year inside [year_from, year_to], both ends inclusive.
    pub fn covers(&self, vehicle: &Vehicle) -> bool {
        self.incident_type == vehicle.incident_type
            && (self.year_from..=self.year_to).contains(&vehicle.year)
    }
}

/// The issued quote for a vehicle. One per vehicle; re-quoting after a vehicle
/// edit rewrites `quoted_value` in place and keeps `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub vehicle: VehicleId,
    /// Stored at currency scale (2 decimal places).
    pub quoted_value: Decimal,
    pub created_at: DateTime<Utc>,
}
