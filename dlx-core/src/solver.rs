//! Recursive exact-cover search over a [`Matrix`], with a caller-supplied [`Validator`] hook for
//! constraints that don't fit naturally into the cover matrix itself.

use crate::matrix::Matrix;

/// Prunes and mutates side state alongside the DLX cover/uncover discipline.
///
/// `apply` and `restore` must be exact inverses: the solver calls them in the same stack
/// discipline it uses for `cover`/`uncover`, so any asymmetry between them corrupts the search
/// the same way an unbalanced cover/uncover would.
pub trait Validator<Sym> {
    /// Checks constraints `Sym` can't express as exact cover. Called before `apply`; must not
    /// mutate validator state.
    fn validate(&self, symbol: &Sym) -> bool;

    /// Records `symbol` as provisionally accepted.
    fn apply(&mut self, symbol: &Sym);

    /// Undoes exactly what `apply(symbol)` did.
    fn restore(&mut self, symbol: &Sym);
}

#[derive(Default)]
struct SearchStats {
    branches: u64,
    backtracks: u64,
}

/// Searches `matrix` for an exact cover, recording the accepted row symbols into `solution` in
/// the order they were applied. Returns `true` and leaves `solution` populated on success;
/// returns `false` and leaves `solution` empty (and `matrix`/`validator` state exactly as found)
/// on exhaustion.
pub fn solve<Sym, V>(matrix: &mut Matrix<Sym>, validator: &mut V, solution: &mut Vec<Sym>) -> bool
where
    Sym: Clone,
    V: Validator<Sym>,
{
    let mut stats = SearchStats::default();
    let found = search(matrix, validator, solution, &mut stats);
    tracing::debug!(
        branches = stats.branches,
        backtracks = stats.backtracks,
        found,
        "dlx search finished"
    );
    found
}

fn search<Sym, V>(
    matrix: &mut Matrix<Sym>,
    validator: &mut V,
    solution: &mut Vec<Sym>,
    stats: &mut SearchStats,
) -> bool
where
    Sym: Clone,
    V: Validator<Sym>,
{
    if matrix.is_solved() {
        return true;
    }

    // select_column() is None only when the root ring is empty, which is_solved() already
    // caught above — every live column has at least the sentinel invariant to fall back on.
    let selected = matrix
        .select_column()
        .expect("a non-solved matrix always has a live column");

    matrix.cover(selected);
    // Chases `down`/`right`/`left` links directly (via `Matrix::down`/`right`/`left`) instead of
    // `iter_col`/`iter_row`, since those borrow `matrix` for the walk's lifetime and this loop
    // needs `&mut matrix` every iteration (`cover`/`uncover` on the row's other columns). Each
    // `next` pointer is captured before anything in that iteration mutates the matrix, so a row
    // hidden and restored mid-walk by a sibling branch doesn't disturb where this walk resumes.
    let mut r = matrix.down(selected);
    while r != selected {
        let next_r = matrix.down(r);
        stats.branches += 1;
        if stats.branches % 4096 == 0 {
            tracing::trace!(
                branches = stats.branches,
                backtracks = stats.backtracks,
                columns_remaining = matrix.columns().len(),
                "dlx search progress"
            );
        }

        let symbol = matrix.symbol(r).clone();
        if validator.validate(&symbol) {
            validator.apply(&symbol);
            let mut n = matrix.right(r);
            while n != r {
                let next_n = matrix.right(n);
                if !matrix.is_row_header(n) {
                    matrix.cover(matrix.col_of(n));
                }
                n = next_n;
            }

            solution.push(symbol.clone());
            if search(matrix, validator, solution, stats) {
                return true;
            }
            solution.pop();
            stats.backtracks += 1;

            let mut n = matrix.left(r);
            while n != r {
                let next_n = matrix.left(n);
                if !matrix.is_row_header(n) {
                    matrix.uncover(matrix.col_of(n));
                }
                n = next_n;
            }
            validator.restore(&symbol);
        }

        r = next_r;
    }
    matrix.uncover(selected);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Pick(usize);

    struct NoopValidator;
    impl Validator<Pick> for NoopValidator {
        fn validate(&self, _symbol: &Pick) -> bool {
            true
        }
        fn apply(&mut self, _symbol: &Pick) {}
        fn restore(&mut self, _symbol: &Pick) {}
    }

    /// Textbook exact-cover instance from Knuth's paper: rows A..F over columns 1..7, unique
    /// solution {B, D, F} (0-indexed: rows 1, 3, 5).
    fn knuth_example() -> Matrix<Pick> {
        let rows: [&[usize]; 6] = [
            &[0, 3, 6],    // A
            &[0, 3],       // B
            &[3, 4, 6],    // C
            &[2, 4, 5],    // D
            &[1, 2, 5, 6], // E
            &[1, 6],       // F
        ];
        let mut m = Matrix::new();
        let cols: Vec<_> = (0..7).map(|_| m.create_column()).collect();
        for (i, row) in rows.iter().enumerate() {
            let row_id = m.create_row(Pick(i));
            for &c in *row {
                m.add_node(row_id, cols[c]);
            }
        }
        m
    }

    #[test]
    fn finds_the_unique_solution() {
        let mut m = knuth_example();
        let mut validator = NoopValidator;
        let mut solution = Vec::new();
        assert!(solve(&mut m, &mut validator, &mut solution));

        let mut picks: Vec<usize> = solution.iter().map(|Pick(i)| *i).collect();
        picks.sort_unstable();
        assert_eq!(picks, vec![1, 3, 5]);
    }

    #[test]
    fn reports_infeasible_and_leaves_no_partial_solution() {
        let mut m: Matrix<Pick> = Matrix::new();
        let col = m.create_column();
        // No row ever covers `col`, so the column can never be satisfied.
        let _ = col;
        let mut validator = NoopValidator;
        let mut solution = Vec::new();
        assert!(!solve(&mut m, &mut validator, &mut solution));
        assert!(solution.is_empty());
    }

    struct RejectAll;
    impl Validator<Pick> for RejectAll {
        fn validate(&self, _symbol: &Pick) -> bool {
            false
        }
        fn apply(&mut self, _symbol: &Pick) {}
        fn restore(&mut self, _symbol: &Pick) {}
    }

    #[test]
    fn validator_rejection_prunes_every_branch() {
        let mut m = knuth_example();
        let mut validator = RejectAll;
        let mut solution = Vec::new();
        assert!(!solve(&mut m, &mut validator, &mut solution));
        assert!(solution.is_empty());
        // matrix must be back to its pre-search state: every original column still live.
        assert_eq!(m.columns().len(), 7);
    }

    #[test]
    fn search_is_deterministic_across_runs() {
        let mut m1 = knuth_example();
        let mut m2 = knuth_example();
        let mut v1 = NoopValidator;
        let mut v2 = NoopValidator;
        let mut s1 = Vec::new();
        let mut s2 = Vec::new();
        solve(&mut m1, &mut v1, &mut s1);
        solve(&mut m2, &mut v2, &mut s2);
        assert_eq!(s1, s2);
    }
}
