use std::time::Duration;

use log::{info, warn};

use super::constraints;
use super::objective;
use super::results::RebalancingResults;
use super::sets_and_parameters::{Parameters, Sets};
use super::variables::Variables;
use crate::models::milp::{BuildError, Model, ModelBuilder};
use crate::problem::Problem;
use crate::solver::{SolveError, SolveOutcome, Solver};

/// Tolerance used when checking solver assignments against the model
pub const TOLERANCE: f64 = 1e-6;

/// The multi-period rebalancing MILP of a problem, together with the handles of its
/// variables.
#[derive(Debug)]
pub struct RebalancingModel {
    model: Model,
    vars: Variables,
    sets: Sets,
    parameters: Parameters,
}

impl RebalancingModel {
    pub fn build(problem: &Problem) -> Result<RebalancingModel, BuildError> {
        info!(
            "Building rebalancing model: {} stations, {} vehicles, {} periods, {} bike types",
            problem.stations().len(),
            problem.vehicles().len(),
            problem.timesteps(),
            problem.bike_types().len()
        );

        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, &sets);

        let mut builder = ModelBuilder::new("rebalancing");
        let vars = Variables::register(&mut builder, &sets, &parameters);
        constraints::add_all(&mut builder, &sets, &parameters, &vars)?;
        objective::set_objective(&mut builder, &sets, &parameters, &vars)?;
        let model = builder.build()?;

        info!(
            "Built rebalancing model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );

        Ok(RebalancingModel {
            model,
            vars,
            sets,
            parameters,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn sets(&self) -> &Sets {
        &self.sets
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Solves the model with `solver`. Outcomes other than a solution are returned as-is.
    pub fn solve<S: Solver + ?Sized>(
        &self,
        solver: &S,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome<RebalancingResults>, SolveError> {
        let outcome = solver.solve(&self.model, time_limit)?;

        outcome.try_map(|solution| {
            if let Some(missing) = self
                .model
                .variables()
                .iter()
                .find(|v| solution.assignment.get(&v.name).is_none())
            {
                return Err(SolveError::MissingValue(missing.name.clone()));
            }

            for violation in self.model.check(&solution.assignment, TOLERANCE) {
                warn!("{}", violation);
            }

            let results = RebalancingResults::new(self, &solution)?;
            info!("Solved with weighted unmet demand {}", results.objective);
            Ok(results)
        })
    }
}
