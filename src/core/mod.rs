mod engine;
mod types;

pub use engine::{MAX_YEARS, project};
pub use types::{ProjectionError, ProjectionInput, ProjectionResult, Totals, YearlyRecord};
