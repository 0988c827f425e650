use std::collections::BTreeMap;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::expr::{Sense, VarId};
use super::model::{Model, VarKind};

/// Solved values of a model, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, From, Into, Serialize, Deserialize)]
pub struct Assignment(BTreeMap<String, f64>);

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl FromIterator<(String, f64)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Assignment(iter.into_iter().collect())
    }
}

/// A way in which an assignment fails to satisfy a model.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum Violation {
    #[display(fmt = "no value for variable `{}`", _0)]
    Missing(String),
    #[display(fmt = "variable `{}` = {} is outside its bounds", variable, value)]
    Bound { variable: String, value: f64 },
    #[display(fmt = "variable `{}` = {} is not integral", variable, value)]
    Integrality { variable: String, value: f64 },
    #[display(fmt = "constraint `{}` violated: {} {} {}", name, lhs, sense, rhs)]
    Constraint {
        name: String,
        lhs: f64,
        sense: Sense,
        rhs: f64,
    },
}

impl Model {
    /// The value assigned to `var`, if any
    pub fn value(&self, assignment: &Assignment, var: VarId) -> Option<f64> {
        assignment.get(&self.variable(var).name)
    }

    fn evaluate(&self, assignment: &Assignment, terms: &[(VarId, f64)]) -> Option<f64> {
        terms.iter().try_fold(0.0, |acc, (var, coeff)| {
            Some(acc + coeff * self.value(assignment, *var)?)
        })
    }

    /// The objective value under `assignment`, or `None` if a referenced variable is missing
    pub fn objective_value(&self, assignment: &Assignment) -> Option<f64> {
        let objective = self.objective();
        Some(self.evaluate(assignment, objective.terms())? + objective.constant())
    }

    /// Every bound, integrality and constraint violation of `assignment`, within `tolerance`
    pub fn check(&self, assignment: &Assignment, tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for variable in self.variables() {
            let value = match assignment.get(&variable.name) {
                Some(value) => value,
                None => {
                    violations.push(Violation::Missing(variable.name.clone()));
                    continue;
                }
            };

            let below = value < variable.lower - tolerance;
            let above = variable.upper.map_or(false, |ub| value > ub + tolerance);
            if below || above || value.is_nan() {
                violations.push(Violation::Bound {
                    variable: variable.name.clone(),
                    value,
                });
            }

            if variable.kind != VarKind::Continuous && (value - value.round()).abs() > tolerance {
                violations.push(Violation::Integrality {
                    variable: variable.name.clone(),
                    value,
                });
            }
        }

        for constraint in self.constraints() {
            // Missing values were reported above
            if let Some(lhs) = self.evaluate(assignment, constraint.terms()) {
                if !constraint.sense().holds(lhs, constraint.rhs(), tolerance) {
                    violations.push(Violation::Constraint {
                        name: constraint.name().to_string(),
                        lhs,
                        sense: constraint.sense(),
                        rhs: constraint.rhs(),
                    });
                }
            }
        }

        violations
    }

    /// Whether `assignment` satisfies every bound, integrality requirement and constraint
    pub fn is_feasible(&self, assignment: &Assignment, tolerance: f64) -> bool {
        self.check(assignment, tolerance).is_empty()
    }
}
