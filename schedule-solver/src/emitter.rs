//! Renders a solved schedule as a staff-by-day CSV grid: one header row of dates, one row per
//! staff member, each cell either a period name or the vacation marker.

use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;

use crate::error::AppError;
use crate::model::{Constraints, StaffId, Symbol};

const VACATION_MARKER: &str = "公休";

pub fn write_solution(constraints: &Constraints, solution: &[Symbol], path: &Path) -> Result<(), AppError> {
    let mut grid: HashMap<StaffId, Vec<String>> = constraints
        .staff
        .keys()
        .map(|&s| (s, vec![String::new(); constraints.days]))
        .collect();

    for symbol in solution {
        match symbol {
            Symbol::Arrangement { day, period, staff, .. } => {
                let name = &constraints.periods[period].name;
                for &s in staff {
                    grid.get_mut(&s).expect("every staff id in a solution row is known")[*day] = name.clone();
                }
            }
            Symbol::Vacation { staff, days, .. } => {
                for &day in days {
                    grid.get_mut(staff).expect("every staff id in a solution row is known")[day] =
                        VACATION_MARKER.to_string();
                }
            }
        }
    }

    let map_io = |source: std::io::Error| AppError::Output {
        path: path.to_path_buf(),
        source,
    };
    let map_csv = |source: csv::Error| AppError::OutputCsv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(map_csv)?;

    let mut header = vec![String::new()];
    for day in 0..constraints.days {
        let date = constraints.begin + Duration::days(day as i64);
        header.push(date.to_string());
    }
    writer.write_record(&header).map_err(map_csv)?;

    for (&staff_id, staff) in &constraints.staff {
        let mut row = vec![staff.name.clone()];
        row.extend(grid[&staff_id].iter().cloned());
        writer.write_record(&row).map_err(map_csv)?;
    }

    writer.flush().map_err(map_io)?;
    Ok(())
}
