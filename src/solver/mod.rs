//! The boundary between the model and the engine that solves it.

#[cfg(feature = "gurobi")]
pub mod gurobi;

use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::models::milp::{Assignment, Model};

/// A solved assignment and the objective value the solver reported for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    pub assignment: Assignment,
}

/// The terminal status of a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome<T = Solution> {
    Solved(T),
    Infeasible,
    Unbounded,
    /// The time limit was reached before optimality was proven
    TimedOut,
}

impl<T> SolveOutcome<T> {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }

    pub fn solved(self) -> Option<T> {
        match self {
            SolveOutcome::Solved(t) => Some(t),
            _ => None,
        }
    }

    /// Transforms the solved value, passing the other outcomes through unchanged
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<SolveOutcome<U>, E> {
        Ok(match self {
            SolveOutcome::Solved(t) => SolveOutcome::Solved(f(t)?),
            SolveOutcome::Infeasible => SolveOutcome::Infeasible,
            SolveOutcome::Unbounded => SolveOutcome::Unbounded,
            SolveOutcome::TimedOut => SolveOutcome::TimedOut,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum SolveError {
    /// The solver returned an assignment without a value for this variable
    #[display(fmt = "the solver returned no value for `{}`", _0)]
    MissingValue(String),
    /// The solver backend failed
    #[display(fmt = "solver error: {}", _0)]
    Backend(String),
    /// The solver finished with a status that is not a terminal outcome
    #[display(fmt = "unexpected solver status: {}", _0)]
    UnexpectedStatus(String),
    /// A time limit that is negative, NaN or too large for a `Duration`
    #[display(fmt = "invalid time limit of {} seconds", _0)]
    InvalidTimeLimit(f64),
}

impl std::error::Error for SolveError {}

/// A MILP solver. One call is one synchronous solve of `model`, stopped after
/// `time_limit` if one is given.
/// Converts a time limit in seconds, rejecting values `Duration` cannot hold
pub fn time_limit(seconds: f64) -> Result<Duration, SolveError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| SolveError::InvalidTimeLimit(seconds))
}

pub trait Solver {
    fn solve(&self, model: &Model, time_limit: Option<Duration>)
        -> Result<SolveOutcome, SolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsolved_outcomes_pass_through() {
        let outcome: SolveOutcome<f64> = SolveOutcome::TimedOut;
        let mapped = outcome.try_map(|x| Ok::<_, SolveError>(x as i64)).unwrap();
        assert_eq!(mapped, SolveOutcome::TimedOut);
        assert!(!mapped.is_solved());

        let solved = SolveOutcome::Solved(2.5).try_map(|x| Ok::<_, SolveError>(x * 2.0));
        assert_eq!(solved.unwrap().solved(), Some(5.0));
    }

    #[test]
    fn mapping_errors_are_propagated() {
        let outcome = SolveOutcome::Solved(1)
            .try_map(|_| Err::<i32, _>(SolveError::MissingValue("x".to_string())));
        assert_eq!(outcome, Err(SolveError::MissingValue("x".to_string())));
        assert_eq!(
            SolveError::Backend("license".to_string()).to_string(),
            "solver error: license"
        );
    }

    #[test]
    fn time_limits_must_be_non_negative_seconds() {
        assert_eq!(time_limit(1.5), Ok(Duration::from_millis(1500)));
        assert_eq!(time_limit(0.0), Ok(Duration::ZERO));
        assert_eq!(time_limit(-1.0), Err(SolveError::InvalidTimeLimit(-1.0)));
        assert!(matches!(
            time_limit(f64::NAN),
            Err(SolveError::InvalidTimeLimit(x)) if x.is_nan()
        ));
        assert!(time_limit(f64::INFINITY).is_err());
    }
}
