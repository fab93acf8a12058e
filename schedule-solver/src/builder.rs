//! Builds the exact-cover matrix from a normalised [`Constraints`]. Column and row creation
//! order doesn't matter for correctness (the DLX solver's column selection is driven entirely
//! by live node counts), but it does matter for determinism across runs, so both are always
//! driven by the constraints' `BTreeMap`s rather than any `HashMap` iteration.

use std::collections::{BTreeSet, HashMap};

use dlx_core::{ColumnId, Matrix};
use itertools::Itertools;

use crate::model::{Constraints, PeriodId, StaffId, Symbol, TitleId};

/// Builds the matrix described in the component design: four column kinds (per-day staffing,
/// weekly vacation, per-slot headcount, and preference) and two row kinds (arrangements and
/// vacations), with every row touching exactly the columns it satisfies.
pub fn build_matrix(c: &Constraints) -> Matrix<Symbol> {
    let mut m = Matrix::new();

    let mut arrangement_cols: HashMap<(usize, StaffId), ColumnId> = HashMap::new();
    for day in 0..c.days {
        for &staff in c.staff.keys() {
            arrangement_cols.insert((day, staff), m.create_column());
        }
    }

    let weeks = c.days / 7;
    let mut vacation_cols: HashMap<(usize, StaffId), ColumnId> = HashMap::new();
    if c.vacation > 0 {
        for week in 0..weeks {
            for &staff in c.staff.keys() {
                vacation_cols.insert((week, staff), m.create_column());
            }
        }
    }

    // Only headcount entries that actually require staff get a column; an absent or min == 0
    // entry means "no requirement", not "a requirement for zero people" (see the data model).
    let mut period_cols: HashMap<(usize, PeriodId, TitleId), ColumnId> = HashMap::new();
    for day in 0..c.days {
        for &period in c.periods.keys() {
            for &title in c.titles.keys() {
                let key = (day, period, title);
                if matches!(c.headcount.get(&key), Some(&(min, _)) if min > 0) {
                    period_cols.insert(key, m.create_column());
                }
            }
        }
    }

    let mut prefer_cols: HashMap<(usize, StaffId), ColumnId> = HashMap::new();
    let mut prefer_keys: Vec<_> = c.prefer_periods.keys().copied().collect();
    prefer_keys.sort_unstable_by_key(|&(day, staff)| (day, staff.0));
    for key in prefer_keys {
        prefer_cols.insert(key, m.create_column());
    }

    if c.vacation > 0 {
        build_vacation_rows(c, &mut m, &arrangement_cols, &vacation_cols, &prefer_cols);
    }
    // A staff member on vacation every day of the week can never work a period, so generating
    // arrangement rows would be pure waste -- and if any headcount requirement remains, the
    // instance is unsatisfiable regardless of what rows exist.
    if c.vacation < 7 {
        build_arrangement_rows(c, &mut m, &arrangement_cols, &period_cols, &prefer_cols);
    }

    tracing::info!(
        columns = m.columns().len(),
        nodes = m.node_count(),
        "built exact-cover matrix"
    );

    m
}

fn build_vacation_rows(
    c: &Constraints,
    m: &mut Matrix<Symbol>,
    arrangement_cols: &HashMap<(usize, StaffId), ColumnId>,
    vacation_cols: &HashMap<(usize, StaffId), ColumnId>,
    prefer_cols: &HashMap<(usize, StaffId), ColumnId>,
) {
    let weeks = c.days / 7;
    let vacation_len = c.vacation as usize;
    for week in 0..weeks {
        for &staff in c.staff.keys() {
            let week_begin = week * 7;
            let prefers: BTreeSet<usize> = c
                .prefer_vacations
                .get(&staff)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&d| d >= week_begin && d < week_begin + 7)
                .collect();

            for combo in (0..7usize).combinations(vacation_len) {
                let days: BTreeSet<usize> = combo.into_iter().map(|wd| week_begin + wd).collect();
                if !prefers.is_subset(&days) {
                    continue;
                }
                let days_vec: Vec<usize> = days.into_iter().collect();
                let row = m.create_row(Symbol::Vacation {
                    week,
                    staff,
                    days: days_vec.clone(),
                });
                for &day in &days_vec {
                    m.add_node(row, arrangement_cols[&(day, staff)]);
                    if let Some(&col) = prefer_cols.get(&(day, staff)) {
                        m.add_node(row, col);
                    }
                }
                m.add_node(row, vacation_cols[&(week, staff)]);
            }
        }
    }
}

fn build_arrangement_rows(
    c: &Constraints,
    m: &mut Matrix<Symbol>,
    arrangement_cols: &HashMap<(usize, StaffId), ColumnId>,
    period_cols: &HashMap<(usize, PeriodId, TitleId), ColumnId>,
    prefer_cols: &HashMap<(usize, StaffId), ColumnId>,
) {
    for day in 0..c.days {
        for &period in c.periods.keys() {
            for &title in c.titles.keys() {
                let key = (day, period, title);
                let (min, max) = match c.headcount.get(&key) {
                    Some(&(min, max)) if min > 0 => (min, max),
                    _ => continue,
                };

                let available: Vec<StaffId> = c.titles[&title].staff.iter().copied().collect();
                let partner_pairs = c.partners.get(&day);

                for n in min..=max {
                    if n > available.len() {
                        break;
                    }
                    for combo in available.iter().copied().combinations(n) {
                        let staff_set: BTreeSet<StaffId> = combo.into_iter().collect();

                        // Partner equality: for every pair active on this day, both members or
                        // neither must appear in this arrangement.
                        if let Some(pairs) = partner_pairs {
                            let satisfies_all = pairs
                                .iter()
                                .all(|&(a, b)| staff_set.contains(&a) == staff_set.contains(&b));
                            if !satisfies_all {
                                continue;
                            }
                        }

                        let staff_vec: Vec<StaffId> = staff_set.into_iter().collect();
                        let row = m.create_row(Symbol::Arrangement {
                            day,
                            period,
                            title,
                            staff: staff_vec.clone(),
                        });
                        for &staff in &staff_vec {
                            m.add_node(row, arrangement_cols[&(day, staff)]);
                            let prefers_this_period = c
                                .prefer_periods
                                .get(&(day, staff))
                                .map_or(false, |ps| ps.contains(&period));
                            if prefers_this_period {
                                if let Some(&col) = prefer_cols.get(&(day, staff)) {
                                    m.add_node(row, col);
                                }
                            }
                        }
                        m.add_node(row, period_cols[&key]);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};

    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Period, Staff, Title};

    /// One week, two staff sharing a title, one period, exactly one slot per day required.
    fn one_week_two_staff() -> Constraints {
        let mut periods = BTreeMap::new();
        periods.insert(
            PeriodId(1),
            Period {
                id: PeriodId(1),
                name: "day".into(),
                begin_sec: 28_800,
                end_sec: 61_200,
                conflicts: Default::default(),
            },
        );

        let mut title_staff = BTreeSet::new();
        title_staff.insert(StaffId(1));
        title_staff.insert(StaffId(2));
        let mut titles = BTreeMap::new();
        titles.insert(
            TitleId(1),
            Title {
                id: TitleId(1),
                name: "nurse".into(),
                staff: title_staff,
            },
        );

        let mut staff = BTreeMap::new();
        staff.insert(
            StaffId(1),
            Staff {
                id: StaffId(1),
                name: "Alice".into(),
                title: TitleId(1),
            },
        );
        staff.insert(
            StaffId(2),
            Staff {
                id: StaffId(2),
                name: "Bob".into(),
                title: TitleId(1),
            },
        );

        let mut headcount = HashMap::new();
        for day in 0..7 {
            headcount.insert((day, PeriodId(1), TitleId(1)), (1, 1));
        }

        Constraints {
            begin: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            days: 7,
            min_rest_time_sec: 0,
            vacation: 0,
            max_rest_gap: 0,
            max_period_type: 2,
            periods,
            titles,
            staff,
            headcount,
            prefer_periods: HashMap::new(),
            prefer_vacations: HashMap::new(),
            partners: HashMap::new(),
            conflicts: HashMap::new(),
        }
    }

    #[test]
    fn creates_one_arrangement_column_per_staff_per_day() {
        // === given ===
        let c = one_week_two_staff();

        // === when ===
        let m = build_matrix(&c);

        // === then ===
        // 2 staff * 7 days of Arrangement(day, staff) columns + 7 days of Period(day, period,
        // title) columns (min == 1 > 0, so every day gets one); no vacation columns since
        // vacation == 0, no prefer columns since no preferences were set.
        assert_eq!(m.columns().len(), 2 * 7 + 7);
    }

    #[test]
    fn creates_one_arrangement_row_per_eligible_staff_member_per_slot() {
        // === given ===
        let c = one_week_two_staff();

        // === when ===
        let m = build_matrix(&c);

        // === then ===
        // Columns are created in order: 14 per-(day, staff) arrangement columns, then one
        // Period(day, period, title) column per day. Day 0's period column is touched once by
        // the row that picks Alice alone and once by the row that picks Bob alone.
        let columns = m.columns();
        let day0_period_col = columns[14];
        assert_eq!(m.count(day0_period_col), 2);
    }

    #[test]
    fn skips_columns_for_slots_with_no_headcount_requirement() {
        // === given ===
        let mut c = one_week_two_staff();
        c.headcount.remove(&(3, PeriodId(1), TitleId(1)));

        // === when ===
        let m = build_matrix(&c);

        // === then ===
        assert_eq!(m.columns().len(), 2 * 7 + 6);
    }

    #[test]
    fn partner_pair_excludes_arrangements_that_split_the_pair() {
        // === given ===
        // A partner rule on day 0 requires Alice and Bob to always share a period or neither
        // work it, but the slot only wants exactly 1 staff member -- no single-staff row can
        // satisfy that, so day 0 ends up with zero feasible arrangement rows.
        let mut c = one_week_two_staff();
        c.partners.insert(0, vec![(StaffId(1), StaffId(2))]);

        // === when ===
        let m = build_matrix(&c);

        // === then ===
        let columns = m.columns();
        assert_eq!(m.count(columns[14]), 0, "day 0's slot should be unsatisfiable");
        assert_eq!(m.count(columns[15]), 2, "day 1 is unaffected by day 0's partner rule");
    }
}
