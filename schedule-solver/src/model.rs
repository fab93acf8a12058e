//! The normalized schedule domain: periods, titles, staff, and the constraint tables the
//! builder and validator both read. Everything here is produced by [`crate::config::normalize`]
//! from the raw YAML record; nothing in this module parses or validates user input itself.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub i64);
    };
}

id_newtype!(PeriodId);
id_newtype!(TitleId);
id_newtype!(StaffId);

/// A recurring work period, e.g. "day shift" or "night shift".
#[derive(Clone, Debug)]
pub struct Period {
    pub id: PeriodId,
    pub name: String,
    /// Seconds since local midnight.
    pub begin_sec: i64,
    pub end_sec: i64,
    /// Periods that cannot follow this one on the next calendar day without violating
    /// `min_rest_time_sec`. Precomputed once in the normaliser; includes `self.id` when a
    /// period is shorter than the minimum rest requirement allows back-to-back.
    pub conflicts: HashSet<PeriodId>,
}

/// A job title, e.g. "nurse" or "pharmacist". Determines which staff are eligible to fill a
/// given (day, period, title) slot.
#[derive(Clone, Debug)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub staff: BTreeSet<StaffId>,
}

/// An individual staff member.
#[derive(Clone, Debug)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub title: TitleId,
}

/// The minimum and maximum number of staff required for a given (day, period, title).
pub type Headcount = HashMap<(usize, PeriodId, TitleId), (usize, usize)>;

/// The fully normalized, internally-consistent input to the matrix builder and validator.
///
/// Days are addressed as offsets from `begin` (0 = `begin`); weeks group consecutive runs of
/// 7 days, 0-indexed from the start of the horizon. `begin`/`end` are inclusive on both ends
/// and `days == (end - begin).num_days() + 1`, always a multiple of 7 (see
/// [`crate::error::ConfigError::HorizonNotWeekly`]).
pub struct Constraints {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,

    pub min_rest_time_sec: i64,
    pub vacation: u32,
    pub max_rest_gap: i64,
    pub max_period_type: usize,

    pub periods: BTreeMap<PeriodId, Period>,
    pub titles: BTreeMap<TitleId, Title>,
    pub staff: BTreeMap<StaffId, Staff>,

    pub headcount: Headcount,
    pub prefer_periods: HashMap<(usize, StaffId), Vec<PeriodId>>,
    pub prefer_vacations: HashMap<StaffId, BTreeSet<usize>>,
    /// Pairs of staff who must always (resp. never) share a period, keyed by the day the rule
    /// applies to. Pairs are stored with the lower `StaffId` first.
    pub partners: HashMap<usize, Vec<(StaffId, StaffId)>>,
    pub conflicts: HashMap<usize, Vec<(StaffId, StaffId)>>,
}

/// The payload carried by a DLX row: either a staffing arrangement for a single (day, period,
/// title) slot, or a weekly vacation assignment for one staff member.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Arrangement {
        day: usize,
        period: PeriodId,
        title: TitleId,
        /// Sorted, deduplicated by construction (built from a `BTreeSet`).
        staff: Vec<StaffId>,
    },
    Vacation {
        week: usize,
        staff: StaffId,
        /// Sorted day offsets within the week, length `vacation`.
        days: Vec<usize>,
    },
}
