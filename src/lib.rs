//! Quotation and nutrition analytics core.
//!
//! Two independent engines behind plain-data function seams, sharing one
//! design pattern (rule lookup → adjustment → aggregation → comparison):
//!
//! - [`quote`] prices a vehicle against a rating table, with an incident-type
//!   adjustment and a hard cap at the declared value.
//! - [`nutrition`] / [`intake`] compute metabolic targets and classify a
//!   day's logged intake against them; [`cohort`] compares age cohorts over
//!   the same intake data.
//!
//! All computation is synchronous, deterministic and stateless: callers fetch
//! the working set up front and get structured results back. Decimal
//! arithmetic throughout; recoverable anomalies degrade to documented
//! defaults instead of erroring (see [`error::Error`] for the conditions that
//! do surface).

pub mod cohort;
pub mod config;
pub mod dataset;
pub mod error;
pub mod intake;
pub mod nutrition;
pub mod quote;
pub mod types;
pub mod vehicle;
