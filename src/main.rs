use std::fs::File;
use std::io::BufWriter;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use wellrate::cohort::{CohortBreakdown, GroupTotals, RiskAssessment, aggregate_by_age_cohort, evaluate_risk};
use wellrate::config::{LimitBands, NeedsConfig};
use wellrate::dataset::Dataset;
use wellrate::error::Error;
use wellrate::intake::{DailyIntakeRecord, DailyReport, FoodCatalog, daily_report};
use wellrate::quote::validate_factors;
use wellrate::types::UserId;
use wellrate::vehicle::Quotation;

/// Everything the run produced, in the shape the presentation layer consumes.
#[derive(Serialize)]
struct Report {
    quotations: Vec<Quotation>,
    daily: Option<DailyReport>,
    cohorts: CohortBreakdown,
    risk: RiskAssessment,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().collect();

    let mut input_path: Option<String> = None;
    let mut user: Option<u64> = None;
    let mut from: Option<NaiveDate> = None;
    let mut to: Option<NaiveDate> = None;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args[i].clone());
            }
            "--user" => {
                i += 1;
                user = Some(args[i].parse().expect("--user requires a numeric id"));
            }
            "--from" => {
                i += 1;
                from = Some(args[i].parse().expect("--from requires YYYY-MM-DD"));
            }
            "--to" => {
                i += 1;
                to = Some(args[i].parse().expect("--to requires YYYY-MM-DD"));
            }
            "--output" => {
                i += 1;
                output_path = Some(args[i].clone());
            }
            "--quiet" => quiet = true,
            _ => {}
        }
        i += 1;
    }

    let Some(input_path) = input_path else {
        eprintln!(
            "usage: wellrate --input data.json [--user N] [--from YYYY-MM-DD] \
             [--to YYYY-MM-DD] [--output report.json] [--quiet]"
        );
        std::process::exit(1);
    };

    let mut dataset = Dataset::load(&input_path).unwrap_or_else(|e| {
        eprintln!("error: cannot load {input_path} — {e}");
        std::process::exit(1);
    });

    // The engine resolves overlapping rows by table order; surface the
    // ambiguity so the table can be fixed at data entry.
    for overlap in validate_factors(&dataset.rating_factors) {
        eprintln!("warning: ambiguous rating table — {overlap} (first row in table order wins)");
    }

    let date_range = match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (Some(from), None) => Some((from, NaiveDate::MAX)),
        (None, Some(to)) => Some((NaiveDate::MIN, to)),
        (None, None) => None,
    };
    let in_range = |r: &DailyIntakeRecord| match date_range {
        Some((from, to)) => r.date >= from && r.date <= to,
        None => true,
    };

    // ── Quotations ────────────────────────────────────────────────────────────
    let now = Utc::now();
    let quotations: Vec<Quotation> = dataset
        .vehicles
        .iter()
        .map(|v| Quotation::issue(v, &dataset.rating_factors, now))
        .collect();

    if !quiet && !quotations.is_empty() {
        println!("=== Quotations ===");
        println!(
            "{:>4} | {:<24} | {:>4} | {:<14} | {:>12} | {:>12}",
            "Id", "Vehicle", "Year", "Incident", "Declared", "Quoted"
        );
        println!("{}", "-".repeat(84));
        for (vehicle, quotation) in dataset.vehicles.iter().zip(&quotations) {
            println!(
                "{:>4} | {:<24} | {:>4} | {:<14} | {:>12} | {:>12}",
                vehicle.id.0,
                format!("{} {}", vehicle.brand, vehicle.model),
                vehicle.year,
                format!("{:?}", vehicle.incident_type),
                vehicle.declared_value.round_dp(2).to_string(),
                quotation.quoted_value.to_string(),
            );
        }
    }

    // ── Daily intake report ───────────────────────────────────────────────────
    let catalog = FoodCatalog::index(std::mem::take(&mut dataset.foods));
    let scoped_records: Vec<DailyIntakeRecord> =
        dataset.intake_records.iter().filter(|r| in_range(r)).cloned().collect();

    let daily = user.map(UserId).and_then(|user| {
        match daily_report(
            &dataset.profiles,
            user,
            &scoped_records,
            &catalog,
            &NeedsConfig::canonical(),
            &LimitBands::canonical(),
        ) {
            Ok(report) => {
                if !quiet {
                    print_daily_report(user, &report);
                }
                Some(report)
            }
            Err(Error::MissingProfile { user }) => {
                eprintln!(
                    "user {} has no nutritional profile — create one before requesting analysis",
                    user.0
                );
                None
            }
            Err(e) => {
                eprintln!("error: daily report failed — {e}");
                None
            }
        }
    });

    // ── Cohort comparison ─────────────────────────────────────────────────────
    let cohorts = aggregate_by_age_cohort(
        &dataset.profiles,
        &dataset.intake_records,
        &catalog,
        &dataset.food_nutrients,
        &dataset.nutrients,
        date_range,
    );
    let risk = evaluate_risk(&cohorts);

    if !quiet {
        println!("\n=== Cohort comparison ===");
        print_group("under-30", &cohorts.under_thirty);
        print_group("30-plus", &cohorts.thirty_plus);
        println!("\nHigher risk: {} cohort", risk.higher_risk);
        for reason in &risk.reasons {
            println!("  - {reason}");
        }
    }

    if let Some(path) = output_path {
        let report = Report { quotations, daily, cohorts, risk };
        let file = File::create(&path).unwrap_or_else(|e| {
            eprintln!("error: cannot create {path} — {e}");
            std::process::exit(1);
        });
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &report).expect("failed to serialize report");
        if !quiet {
            println!("\nReport written to {path}");
        }
    }
}

fn print_daily_report(user: UserId, report: &DailyReport) {
    println!("\n=== Daily intake — user {} ===", user.0);
    println!(
        "{:<10} | {:>10} | {:>10} | {:>10} | {:>8}",
        "Macro", "Target", "Consumed", "Remaining", "Pct"
    );
    println!("{}", "-".repeat(60));
    let rows = [
        ("calories", report.needs.calories, report.analysis.consumed.calories, report.analysis.remaining.calories, report.analysis.percent_of_needs.calories),
        ("protein", report.needs.protein_g, report.analysis.consumed.protein_g, report.analysis.remaining.protein_g, report.analysis.percent_of_needs.protein),
        ("carbs", report.needs.carbs_g, report.analysis.consumed.carbs_g, report.analysis.remaining.carbs_g, report.analysis.percent_of_needs.carbs),
        ("fat", report.needs.fat_g, report.analysis.consumed.fat_g, report.analysis.remaining.fat_g, report.analysis.percent_of_needs.fat),
    ];
    for (label, target, consumed, remaining, pct) in rows {
        println!(
            "{:<10} | {:>10} | {:>10} | {:>10} | {:>7}%",
            label,
            target.round_dp(1).to_string(),
            consumed.round_dp(1).to_string(),
            remaining.round_dp(1).to_string(),
            pct.round_dp(1).to_string(),
        );
    }
    let status = if report.exceeded {
        "limits exceeded"
    } else if report.met {
        "targets met"
    } else if report.approaching {
        "approaching targets"
    } else {
        "under targets"
    };
    println!("Status: {status}");
}

fn print_group(label: &str, group: &GroupTotals) {
    println!(
        "{label:<10} profiles: {:>3} | avg kcal: {:>10} | protein: {:>8} g | carbs: {:>8} g | fat: {:>8} g | nutrients tracked: {}",
        group.profile_count,
        group.macros.calories.round_dp(1).to_string(),
        group.macros.protein_g.round_dp(1).to_string(),
        group.macros.carbs_g.round_dp(1).to_string(),
        group.macros.fat_g.round_dp(1).to_string(),
        group.micronutrients.len(),
    );
}
