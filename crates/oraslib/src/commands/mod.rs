//! Subcommand implementations.

mod inspect;
mod retrieve;

pub use inspect::{InspectReport, inspect};
pub use retrieve::{RetrieveRequest, StdoutLog, retrieve};
