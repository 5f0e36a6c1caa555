//! Command line interface for tubefetch

pub mod args;
pub mod output;

pub use args::{Args, VerbosityLevel};
pub use output::OutputFormatter;
