//! dlx-core implements Knuth's Dancing Links (DLX) over a toroidal, arena-backed sparse
//! matrix. It knows nothing about any particular exact-cover problem: the row payload is an
//! opaque, caller-supplied `Sym` type, and branch pruning beyond plain set-cover is delegated to
//! a caller-supplied [`Validator`]. See `schedule-solver` for the domain that drives this crate.

pub mod matrix;
pub mod solver;

pub use matrix::{ColumnId, Matrix, RowId};
pub use solver::{solve, Validator};
