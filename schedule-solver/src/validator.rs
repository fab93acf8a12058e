//! Constraints that don't fit naturally as exact-cover columns: rest-time adjacency between
//! consecutive days, how many distinct period types a staff member can work across the
//! horizon, exclusion pairs, and the minimum gap between vacation weeks. Partner equality is
//! deliberately *not* checked here — it's enforced structurally when arrangement rows are
//! generated (see `builder::build_arrangement_rows`), so every row the solver ever considers
//! already satisfies it.

use std::collections::{HashMap, HashSet};

use dlx_core::Validator;

use crate::model::{Constraints, PeriodId, StaffId, Symbol};

pub struct ScheduleValidator<'c> {
    constraints: &'c Constraints,
    /// Per staff member, the period worked on each day they've been assigned one so far.
    arrangements: HashMap<StaffId, HashMap<usize, PeriodId>>,
    /// Per staff member, the vacation days taken in each week assigned so far.
    vacations: HashMap<StaffId, HashMap<usize, Vec<usize>>>,
    /// Per staff member, a running count of how many times each distinct period type has been
    /// worked, so `restore` can tell whether a period type should drop out of the working set.
    period_type_counts: HashMap<StaffId, HashMap<PeriodId, u32>>,
}

impl<'c> ScheduleValidator<'c> {
    pub fn new(constraints: &'c Constraints) -> Self {
        let mut arrangements = HashMap::new();
        let mut vacations = HashMap::new();
        let mut period_type_counts = HashMap::new();
        for &staff in constraints.staff.keys() {
            arrangements.insert(staff, HashMap::new());
            vacations.insert(staff, HashMap::new());
            period_type_counts.insert(staff, HashMap::new());
        }
        Self {
            constraints,
            arrangements,
            vacations,
            period_type_counts,
        }
    }

    fn validate_arrangement(&self, day: usize, period: PeriodId, staff: &[StaffId]) -> bool {
        for &s in staff {
            let assigned = &self.arrangements[&s];

            if let Some(prev_day) = day.checked_sub(1) {
                if let Some(prev_period) = assigned.get(&prev_day) {
                    if self.constraints.periods[prev_period].conflicts.contains(&period) {
                        return false;
                    }
                }
            }
            if let Some(next_period) = assigned.get(&(day + 1)) {
                if self.constraints.periods[&period].conflicts.contains(next_period) {
                    return false;
                }
            }

            let mut types: HashSet<PeriodId> = self.period_type_counts[&s].keys().copied().collect();
            types.insert(period);
            if types.len() > self.constraints.max_period_type {
                return false;
            }

            if let Some(pairs) = self.constraints.conflicts.get(&day) {
                for &(a, b) in pairs {
                    let other = if a == s {
                        b
                    } else if b == s {
                        a
                    } else {
                        continue;
                    };
                    if self.arrangements[&other].get(&day) == Some(&period) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn validate_vacation(&self, week: usize, staff: StaffId, days: &[usize]) -> bool {
        let first = *days.first().expect("vacation symbol always names at least one day");
        let last = *days.last().expect("vacation symbol always names at least one day");

        if let Some(prev_week) = week.checked_sub(1) {
            if let Some(prev_days) = self.vacations[&staff].get(&prev_week) {
                let prev_last = *prev_days.last().expect("stored vacation weeks are never empty");
                if (first as i64 - prev_last as i64) > self.constraints.max_rest_gap {
                    return false;
                }
            }
        }
        if let Some(next_days) = self.vacations[&staff].get(&(week + 1)) {
            let next_first = *next_days.first().expect("stored vacation weeks are never empty");
            if (next_first as i64 - last as i64) > self.constraints.max_rest_gap {
                return false;
            }
        }
        true
    }
}

impl<'c> Validator<Symbol> for ScheduleValidator<'c> {
    fn validate(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Arrangement {
                day, period, staff, ..
            } => self.validate_arrangement(*day, *period, staff),
            Symbol::Vacation { week, staff, days } => self.validate_vacation(*week, *staff, days),
        }
    }

    fn apply(&mut self, symbol: &Symbol) {
        match symbol {
            Symbol::Arrangement { day, period, staff, .. } => {
                for &s in staff {
                    self.arrangements.get_mut(&s).unwrap().insert(*day, *period);
                    *self
                        .period_type_counts
                        .get_mut(&s)
                        .unwrap()
                        .entry(*period)
                        .or_insert(0) += 1;
                }
            }
            Symbol::Vacation { week, staff, days } => {
                self.vacations.get_mut(staff).unwrap().insert(*week, days.clone());
            }
        }
    }

    fn restore(&mut self, symbol: &Symbol) {
        match symbol {
            Symbol::Arrangement { day, period, staff, .. } => {
                for &s in staff {
                    self.arrangements.get_mut(&s).unwrap().remove(day);
                    let counts = self.period_type_counts.get_mut(&s).unwrap();
                    if let Some(count) = counts.get_mut(period) {
                        *count -= 1;
                        if *count == 0 {
                            counts.remove(period);
                        }
                    }
                }
            }
            Symbol::Vacation { week, staff, .. } => {
                self.vacations.get_mut(staff).unwrap().remove(week);
            }
        }
    }
}
