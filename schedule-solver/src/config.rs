//! Reads and normalises the YAML configuration file into a [`Constraints`]. Parsing
//! (`load`) and semantic validation (`normalize`) are kept separate so error messages can
//! distinguish "this isn't YAML" from "this is YAML but doesn't make sense".

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Constraints, Period, PeriodId, Staff, StaffId, Title, TitleId};

/// Accepts either a bare scalar or a list in YAML — staff-number's `period-id: 3` and
/// `period-id: [3, 4]` both deserialize to the same `Vec<i64>` once unwrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
pub struct RawConstraints {
    #[serde(rename = "date-range")]
    pub date_range: (NaiveDate, NaiveDate),
    #[serde(rename = "min-rest-time")]
    pub min_rest_time: i64,
    pub vacation: u32,
    #[serde(rename = "max-rest-gap")]
    pub max_rest_gap: i64,
    #[serde(rename = "max-period-type")]
    pub max_period_type: usize,

    pub period: Vec<RawPeriod>,
    pub title: Vec<RawTitle>,
    pub staff: Vec<RawStaff>,
    #[serde(rename = "staff-number")]
    pub staff_number: Vec<RawStaffNumber>,

    #[serde(rename = "prefer-period", default)]
    pub prefer_period: Vec<RawPreferPeriod>,
    #[serde(rename = "prefer-vacation", default)]
    pub prefer_vacation: Vec<RawPreferVacation>,
    #[serde(default)]
    pub partner: Vec<RawPair>,
    #[serde(default)]
    pub confliction: Vec<RawPair>,
}

#[derive(Debug, Deserialize)]
pub struct RawPeriod {
    pub id: i64,
    pub name: String,
    pub begin: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct RawTitle {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawStaff {
    pub id: i64,
    pub name: String,
    #[serde(rename = "title-id")]
    pub title_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RawStaffNumber {
    #[serde(rename = "date-range")]
    pub date_range: (NaiveDate, NaiveDate),
    #[serde(rename = "period-id")]
    pub period_id: OneOrMany<i64>,
    #[serde(rename = "title-id")]
    pub title_id: OneOrMany<i64>,
    #[serde(rename = "number-range")]
    pub number_range: (usize, usize),
}

#[derive(Debug, Deserialize)]
pub struct RawPreferPeriod {
    #[serde(rename = "date-range")]
    pub date_range: (NaiveDate, NaiveDate),
    #[serde(rename = "staff-id")]
    pub staff_id: i64,
    #[serde(rename = "period-id")]
    pub period_id: OneOrMany<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawPreferVacation {
    #[serde(rename = "staff-id")]
    pub staff_id: i64,
    pub days: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RawPair {
    #[serde(rename = "date-range")]
    pub date_range: (NaiveDate, NaiveDate),
    #[serde(rename = "staff-id")]
    pub staff_id: Vec<i64>,
}

/// Reads `path` and parses it as YAML. Does no semantic validation; that's [`normalize`]'s job.
pub fn load(path: &Path) -> Result<RawConstraints, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Turns a parsed-but-unchecked [`RawConstraints`] into a [`Constraints`] every other component
/// can trust: every id reference resolves, every date range lies within the horizon, and the
/// horizon itself is an integral number of weeks.
pub fn normalize(raw: RawConstraints) -> Result<Constraints, ConfigError> {
    let (begin, end) = raw.date_range;
    let days = (end - begin).num_days() + 1;
    if days <= 0 || days % 7 != 0 {
        return Err(ConfigError::HorizonNotWeekly { begin, end, days });
    }
    let days = days as usize;

    if raw.vacation > 7 {
        return Err(ConfigError::VacationOutOfRange(raw.vacation));
    }

    let mut periods: BTreeMap<PeriodId, Period> = BTreeMap::new();
    for p in &raw.period {
        let id = PeriodId(p.id);
        if periods.contains_key(&id) {
            return Err(ConfigError::DuplicateId {
                kind: "period",
                id: p.id,
            });
        }
        periods.insert(
            id,
            Period {
                id,
                name: p.name.clone(),
                begin_sec: p.begin,
                end_sec: p.end,
                conflicts: HashSet::new(),
            },
        );
    }
    precompute_period_conflicts(&mut periods, raw.min_rest_time * 3600);

    let mut titles: BTreeMap<TitleId, Title> = BTreeMap::new();
    for t in &raw.title {
        let id = TitleId(t.id);
        if titles.contains_key(&id) {
            return Err(ConfigError::DuplicateId {
                kind: "title",
                id: t.id,
            });
        }
        titles.insert(
            id,
            Title {
                id,
                name: t.name.clone(),
                staff: BTreeSet::new(),
            },
        );
    }

    let mut staff: BTreeMap<StaffId, Staff> = BTreeMap::new();
    for s in &raw.staff {
        let id = StaffId(s.id);
        if staff.contains_key(&id) {
            return Err(ConfigError::DuplicateId {
                kind: "staff",
                id: s.id,
            });
        }
        let title_id = TitleId(s.title_id);
        let title = titles.get_mut(&title_id).ok_or(ConfigError::UnknownTitle {
            staff_id: s.id,
            title_id: s.title_id,
        })?;
        title.staff.insert(id);
        staff.insert(
            id,
            Staff {
                id,
                name: s.name.clone(),
                title: title_id,
            },
        );
    }

    let mut headcount = HashMap::new();
    for sn in &raw.staff_number {
        let day_range = day_offsets(sn.date_range, begin, end, "staff-number")?;
        for &pid in &sn.period_id.as_ref_vec() {
            let period_id = PeriodId(pid);
            if !periods.contains_key(&period_id) {
                return Err(ConfigError::UnknownPeriod {
                    field: "staff-number",
                    period_id: pid,
                });
            }
            for &tid in &sn.title_id.as_ref_vec() {
                let title_id = TitleId(tid);
                if !titles.contains_key(&title_id) {
                    return Err(ConfigError::UnknownTitleRef {
                        field: "staff-number",
                        title_id: tid,
                    });
                }
                for &day in &day_range {
                    headcount.insert((day, period_id, title_id), sn.number_range);
                }
            }
        }
    }

    let mut prefer_periods: HashMap<(usize, StaffId), Vec<PeriodId>> = HashMap::new();
    for pp in &raw.prefer_period {
        let day_range = day_offsets(pp.date_range, begin, end, "prefer-period")?;
        let staff_id = StaffId(pp.staff_id);
        if !staff.contains_key(&staff_id) {
            return Err(ConfigError::UnknownStaffRef {
                field: "prefer-period",
                staff_id: pp.staff_id,
            });
        }
        let mut period_ids = Vec::new();
        for &pid in &pp.period_id.as_ref_vec() {
            let period_id = PeriodId(pid);
            if !periods.contains_key(&period_id) {
                return Err(ConfigError::UnknownPeriod {
                    field: "prefer-period",
                    period_id: pid,
                });
            }
            period_ids.push(period_id);
        }
        for day in day_range {
            prefer_periods.insert((day, staff_id), period_ids.clone());
        }
    }

    let mut prefer_vacations: HashMap<StaffId, BTreeSet<usize>> = HashMap::new();
    for pv in &raw.prefer_vacation {
        let staff_id = StaffId(pv.staff_id);
        if !staff.contains_key(&staff_id) {
            return Err(ConfigError::UnknownStaffRef {
                field: "prefer-vacation",
                staff_id: pv.staff_id,
            });
        }
        for &day in &pv.days {
            if day < begin || day > end {
                return Err(ConfigError::PreferVacationOutOfHorizon {
                    day,
                    staff_id: pv.staff_id,
                    horizon_begin: begin,
                    horizon_end: end,
                });
            }
            let offset = (day - begin).num_days() as usize;
            prefer_vacations.entry(staff_id).or_default().insert(offset);
        }
    }

    let partners = normalize_pairs(&raw.partner, begin, end, &staff, "partner")?;
    let conflicts = normalize_pairs(&raw.confliction, begin, end, &staff, "confliction")?;

    Ok(Constraints {
        begin,
        end,
        days,
        min_rest_time_sec: raw.min_rest_time * 3600,
        vacation: raw.vacation,
        max_rest_gap: raw.max_rest_gap,
        max_period_type: raw.max_period_type,
        periods,
        titles,
        staff,
        headcount,
        prefer_periods,
        prefer_vacations,
        partners,
        conflicts,
    })
}

impl<T: Copy> OneOrMany<T> {
    fn as_ref_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![*v],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

fn precompute_period_conflicts(periods: &mut BTreeMap<PeriodId, Period>, min_rest_time_sec: i64) {
    const SECONDS_PER_DAY: i64 = 86_400;
    // Borrow every period's start time up front: the conflict check compares `p.end_sec`
    // against every *other* period's `begin_sec`, including `p`'s own, so we can't borrow
    // `periods` both immutably and mutably in the same loop.
    let begins: BTreeMap<PeriodId, i64> = periods.iter().map(|(&id, p)| (id, p.begin_sec)).collect();
    for p in periods.values_mut() {
        for (&other_id, &other_begin) in &begins {
            // resting from `p`'s end until `other` begins the next calendar day.
            let rest = SECONDS_PER_DAY + other_begin - p.end_sec;
            if rest < min_rest_time_sec {
                p.conflicts.insert(other_id);
            }
        }
    }
}

fn day_offsets(
    range: (NaiveDate, NaiveDate),
    horizon_begin: NaiveDate,
    horizon_end: NaiveDate,
    field: &'static str,
) -> Result<Vec<usize>, ConfigError> {
    let (begin, end) = range;
    if begin < horizon_begin || end > horizon_end || begin > end {
        return Err(ConfigError::DateRangeOutOfHorizon {
            field,
            begin,
            end,
            horizon_begin,
            horizon_end,
        });
    }
    let start = (begin - horizon_begin).num_days() as usize;
    let len = (end - begin).num_days() as usize + 1;
    Ok((start..start + len).collect())
}

fn normalize_pairs(
    raw: &[RawPair],
    horizon_begin: NaiveDate,
    horizon_end: NaiveDate,
    staff: &BTreeMap<StaffId, Staff>,
    field: &'static str,
) -> Result<HashMap<usize, Vec<(StaffId, StaffId)>>, ConfigError> {
    let mut out: HashMap<usize, Vec<(StaffId, StaffId)>> = HashMap::new();
    for pair in raw {
        if pair.staff_id.len() != 2 {
            return Err(ConfigError::PairGroupSize {
                field,
                count: pair.staff_id.len(),
            });
        }
        let a = StaffId(pair.staff_id[0]);
        let b = StaffId(pair.staff_id[1]);
        for &id in &[a, b] {
            if !staff.contains_key(&id) {
                return Err(ConfigError::UnknownStaffRef {
                    field,
                    staff_id: id.0,
                });
            }
        }
        let (lo, hi) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        let day_range = day_offsets(pair.date_range, horizon_begin, horizon_end, field)?;
        for day in day_range {
            out.entry(day).or_default().push((lo, hi));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
date-range: [2024-01-01, 2024-01-07]
min-rest-time: 11
vacation: 1
max-rest-gap: 4
max-period-type: 2
period:
  - {id: 1, name: day, begin: 28800, end: 61200}
  - {id: 2, name: night, begin: 61200, end: 86400}
title:
  - {id: 1, name: nurse}
staff:
  - {id: 1, name: Alice, title-id: 1}
  - {id: 2, name: Bob, title-id: 1}
staff-number:
  - date-range: [2024-01-01, 2024-01-07]
    period-id: [1, 2]
    title-id: 1
    number-range: [1, 1]
"#;

    fn parse(yaml: &str) -> RawConstraints {
        serde_yaml::from_str(yaml).expect("test fixture is valid YAML")
    }

    #[test]
    fn normalizes_a_minimal_week() {
        // === given ===
        let raw = parse(MINIMAL);

        // === when ===
        let constraints = normalize(raw).expect("minimal fixture should normalize cleanly");

        // === then ===
        assert_eq!(constraints.days, 7);
        assert_eq!(constraints.staff.len(), 2);
        assert_eq!(constraints.periods.len(), 2);
        assert_eq!(
            constraints.headcount[&(0, PeriodId(1), TitleId(1))],
            (1, 1)
        );
    }

    #[test]
    fn night_shift_followed_by_day_shift_conflicts_under_a_short_rest_window() {
        // === given ===
        // night ends at midnight, day begins at 08:00 the same morning: 8 hours of rest,
        // short of the configured 11-hour minimum.
        let raw = parse(MINIMAL);

        // === when ===
        let constraints = normalize(raw).unwrap();

        // === then ===
        assert!(constraints.periods[&PeriodId(2)].conflicts.contains(&PeriodId(1)));
        assert!(!constraints.periods[&PeriodId(1)].conflicts.contains(&PeriodId(2)));
    }

    #[test]
    fn rejects_a_horizon_that_is_not_a_whole_number_of_weeks() {
        // === given ===
        let yaml = MINIMAL.replacen("2024-01-07", "2024-01-06", 1);
        let raw = parse(&yaml);

        // === when ===
        let result = normalize(raw);

        // === then ===
        assert!(matches!(result, Err(ConfigError::HorizonNotWeekly { .. })));
    }

    #[test]
    fn rejects_vacation_over_seven_days() {
        // === given ===
        let yaml = MINIMAL.replacen("vacation: 1", "vacation: 8", 1);
        let raw = parse(&yaml);

        // === when ===
        let result = normalize(raw);

        // === then ===
        assert!(matches!(result, Err(ConfigError::VacationOutOfRange(8))));
    }

    #[test]
    fn rejects_staff_referencing_an_unknown_title() {
        // === given ===
        let yaml = MINIMAL.replacen("title-id: 1}\n  - {id: 2", "title-id: 99}\n  - {id: 2", 1);
        let raw = parse(&yaml);

        // === when ===
        let result = normalize(raw);

        // === then ===
        assert!(matches!(result, Err(ConfigError::UnknownTitle { .. })));
    }

    #[test]
    fn rejects_a_partner_group_that_is_not_a_pair() {
        // === given ===
        let yaml = format!(
            "{MINIMAL}partner:\n  - date-range: [2024-01-01, 2024-01-07]\n    staff-id: [1]\n"
        );
        let raw = parse(&yaml);

        // === when ===
        let result = normalize(raw);

        // === then ===
        assert!(matches!(result, Err(ConfigError::PairGroupSize { field: "partner", count: 1 })));
    }

    #[test]
    fn partner_pairs_are_normalized_with_the_lower_id_first() {
        // === given ===
        let yaml = format!(
            "{MINIMAL}partner:\n  - date-range: [2024-01-01, 2024-01-07]\n    staff-id: [2, 1]\n"
        );
        let raw = parse(&yaml);

        // === when ===
        let constraints = normalize(raw).unwrap();

        // === then ===
        assert_eq!(constraints.partners[&0], vec![(StaffId(1), StaffId(2))]);
    }
}
