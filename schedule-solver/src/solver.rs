//! Wires the domain model to `dlx-core`'s generic search: builds the matrix, constructs the
//! validator, and runs the recursion on a dedicated thread with an enlarged stack (the
//! recursion depth is one stack frame per row accepted, which for a full horizon can run
//! deeper than the default thread stack allows).

use std::time::Instant;

use crate::builder::build_matrix;
use crate::model::{Constraints, Symbol};
use crate::validator::ScheduleValidator;

const SOLVER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Runs the exact-cover search in-place on the current thread. Prefer
/// [`solve_on_dedicated_stack`] from `main`; this entry point exists mainly so tests can run
/// the search without paying for a thread spawn.
pub fn solve(constraints: &Constraints) -> Option<Vec<Symbol>> {
    let mut matrix = build_matrix(constraints);
    let mut validator = ScheduleValidator::new(constraints);
    let mut solution = Vec::new();

    let start = Instant::now();
    let found = dlx_core::solve(&mut matrix, &mut validator, &mut solution);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if found {
        tracing::info!(elapsed_ms, rows = solution.len(), "schedule solved");
        Some(solution)
    } else {
        tracing::info!(elapsed_ms, "no feasible schedule exists for this input");
        None
    }
}

/// Spawns a scoped thread with [`SOLVER_STACK_SIZE`] bytes of stack and runs [`solve`] on it,
/// blocking until it finishes. This is not a concurrency feature: the thread is joined before
/// the caller proceeds, and there is never more than one thread doing search work at a time.
pub fn solve_on_dedicated_stack(constraints: &Constraints) -> Option<Vec<Symbol>> {
    std::thread::scope(|scope| {
        std::thread::Builder::new()
            .stack_size(SOLVER_STACK_SIZE)
            .spawn_scoped(scope, || solve(constraints))
            .expect("failed to spawn solver thread")
            .join()
            .expect("solver thread panicked")
    })
}
