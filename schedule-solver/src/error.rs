//! The single error type that crosses the config/normalisation boundary, plus the thin wrapper
//! `main` uses to map every fatal condition onto an exit code.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong reading and normalising a schedule configuration. This is the
/// only error type in the crate that implements [`std::error::Error`] and crosses an API
/// boundary as a `Result`; violations of internal invariants are bugs and panic instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path} as YAML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("horizon {begin}..={end} spans {days} days, which is not a multiple of 7")]
    HorizonNotWeekly {
        begin: NaiveDate,
        end: NaiveDate,
        days: i64,
    },

    #[error("vacation must be between 0 and 7 days per week, got {0}")]
    VacationOutOfRange(u32),

    #[error(
        "{field} date-range {begin}..={end} is not contained in the horizon {horizon_begin}..={horizon_end}"
    )]
    DateRangeOutOfHorizon {
        field: &'static str,
        begin: NaiveDate,
        end: NaiveDate,
        horizon_begin: NaiveDate,
        horizon_end: NaiveDate,
    },

    #[error(
        "prefer-vacation day {day} for staff-id {staff_id} is not contained in the horizon {horizon_begin}..={horizon_end}"
    )]
    PreferVacationOutOfHorizon {
        day: NaiveDate,
        staff_id: i64,
        horizon_begin: NaiveDate,
        horizon_end: NaiveDate,
    },

    #[error("{field} group must name exactly two staff, got {count}")]
    PairGroupSize { field: &'static str, count: usize },

    #[error("staff-id {staff_id} references unknown title-id {title_id}")]
    UnknownTitle { staff_id: i64, title_id: i64 },

    #[error("{field} references unknown period-id {period_id}")]
    UnknownPeriod { field: &'static str, period_id: i64 },

    #[error("{field} references unknown title-id {title_id}")]
    UnknownTitleRef { field: &'static str, title_id: i64 },

    #[error("{field} references unknown staff-id {staff_id}")]
    UnknownStaffRef { field: &'static str, staff_id: i64 },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: i64 },
}

/// Top-level error `main` can receive: either a [`ConfigError`] (exit code 1) or a failure to
/// write the solution file (also exit code 1 — a write failure is a user/environment problem,
/// not an internal invariant violation).
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not write solution to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write solution to {path}: {source}")]
    OutputCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
