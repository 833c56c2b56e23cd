//! Result type that keeps degradation visible

use crate::PlannerError;
use crate::models::Warning;

/// Result of a step that can succeed, succeed with caveats, or fail
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    /// Usable value produced from incomplete or substituted data
    Degraded(T, Vec<Warning>),
    Fatal(PlannerError),
}

impl<T> Outcome<T> {
    /// `Ok` when there are no warnings, `Degraded` otherwise
    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            Outcome::Ok(value)
        } else {
            Outcome::Degraded(value, warnings)
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Degraded(value, warnings) => Outcome::Degraded(f(value), warnings),
            Outcome::Fatal(err) => Outcome::Fatal(err),
        }
    }

    /// Split into value and warnings, or the fatal error
    pub fn into_result(self) -> Result<(T, Vec<Warning>), PlannerError> {
        match self {
            Outcome::Ok(value) => Ok((value, Vec::new())),
            Outcome::Degraded(value, warnings) => Ok((value, warnings)),
            Outcome::Fatal(err) => Err(err),
        }
    }
}
