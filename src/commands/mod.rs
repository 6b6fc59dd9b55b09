//! CLI command implementations.

pub mod calibrate;
pub mod check;
pub mod parse;

pub use calibrate::CalibrateCommand;
pub use check::{CheckCommand, CheckReport};
pub use parse::{ParseCommand, ParseReport};
