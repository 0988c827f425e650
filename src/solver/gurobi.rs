use std::time::Duration;

use grb::prelude::*;
use log::{debug, info, warn};

use super::{Solution, SolveError, SolveOutcome, Solver};
use crate::models::milp::{self, Assignment, ObjectiveSense, VarKind};

impl From<grb::Error> for SolveError {
    fn from(err: grb::Error) -> Self {
        SolveError::Backend(err.to_string())
    }
}

/// Solves models with Gurobi
#[derive(Debug, Clone)]
pub struct Gurobi {
    /// Whether Gurobi may print its log to the console
    pub verbose: bool,
    /// Number of threads Gurobi may use, 0 lets Gurobi decide
    pub threads: i32,
}

impl Default for Gurobi {
    fn default() -> Self {
        Gurobi {
            verbose: false,
            threads: 0,
        }
    }
}

impl Gurobi {
    /// Translates `model` into a Gurobi model, returning it together with its variables
    /// in registration order.
    fn translate(&self, model: &milp::Model) -> grb::Result<(Model, Vec<Var>)> {
        let mut grb_model = Model::new(model.name())?;
        grb_model.set_param(param::OutputFlag, self.verbose as i32)?;
        grb_model.set_param(param::Threads, self.threads)?;
        // Report infeasible and unbounded models separately
        grb_model.set_param(param::DualReductions, 0)?;

        let mut vars = Vec::with_capacity(model.num_vars());
        for variable in model.variables() {
            let vtype = match variable.kind {
                VarKind::Continuous => VarType::Continuous,
                VarKind::Integer => VarType::Integer,
                VarKind::Binary => VarType::Binary,
            };
            let ub = variable.upper.unwrap_or(grb::INFINITY);
            vars.push(grb_model.add_var(
                &variable.name,
                vtype,
                0.0,
                variable.lower,
                ub,
                std::iter::empty(),
            )?);
        }

        grb_model.update()?;

        let expr = |terms: &[(milp::VarId, f64)]| {
            let mut expr = grb::expr::LinExpr::new();
            for (var, coeff) in terms {
                expr.add_term(*coeff, vars[var.index()]);
            }
            expr
        };

        for constraint in model.constraints() {
            let lhs = expr(constraint.terms());
            let rhs = constraint.rhs();
            let constr = match constraint.sense() {
                milp::Sense::Le => c!(lhs <= rhs),
                milp::Sense::Ge => c!(lhs >= rhs),
                milp::Sense::Eq => c!(lhs == rhs),
            };
            grb_model.add_constr(constraint.name(), constr)?;
        }

        let objective = model.objective();
        let mut obj = expr(objective.terms());
        obj.add_constant(objective.constant());
        let sense = match objective.sense() {
            ObjectiveSense::Minimize => Minimize,
            ObjectiveSense::Maximize => Maximize,
        };
        grb_model.set_objective(obj, sense)?;

        grb_model.update()?;
        Ok((grb_model, vars))
    }
}

impl Solver for Gurobi {
    fn solve(
        &self,
        model: &milp::Model,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, SolveError> {
        let (mut grb_model, vars) = self.translate(model)?;
        if let Some(limit) = time_limit {
            grb_model.set_param(param::TimeLimit, limit.as_secs_f64())?;
        }

        info!(
            "Solving {} with Gurobi ({} variables, {} constraints)",
            model.name(),
            model.num_vars(),
            model.num_constrs()
        );
        grb_model.optimize()?;

        let status = grb_model.status()?;
        debug!("Gurobi finished with status {:?}", status);

        match status {
            Status::Optimal | Status::SubOptimal => (),
            Status::Infeasible => return Ok(SolveOutcome::Infeasible),
            Status::Unbounded => return Ok(SolveOutcome::Unbounded),
            Status::TimeLimit => {
                if grb_model.get_attr(attr::SolCount)? > 0 {
                    warn!("Time limit reached, discarding the incumbent solution");
                }
                return Ok(SolveOutcome::TimedOut);
            }
            other => return Err(SolveError::UnexpectedStatus(format!("{:?}", other))),
        }

        let mut assignment = Assignment::new();
        for (variable, var) in model.variables().iter().zip(vars.iter()) {
            assignment.set(variable.name.clone(), grb_model.get_obj_attr(attr::X, var)?);
        }
        let objective = grb_model.get_attr(attr::ObjVal)?;

        Ok(SolveOutcome::Solved(Solution {
            objective,
            assignment,
        }))
    }
}
