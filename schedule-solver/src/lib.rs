//! Turns a YAML staff-scheduling configuration into a filled-in schedule by exact-cover
//! search: [`config`] parses and normalises the input, [`builder`] lays it out as a DLX
//! matrix, [`validator`] prunes branches the matrix can't express on its own, [`solver`] runs
//! the search, and [`emitter`] writes the result back out as CSV.

pub mod builder;
pub mod config;
pub mod emitter;
pub mod error;
pub mod model;
pub mod solver;
pub mod validator;

pub use error::{AppError, ConfigError};
pub use model::Constraints;
